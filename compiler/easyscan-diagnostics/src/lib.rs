/// Abort on a broken internal invariant.
///
/// This is reserved for states the parser or visitor can never reach on any input; everything a
/// user can cause is reported through a diagnostic instead.
#[macro_export]
macro_rules! ice {
    ($message:expr) => {{
        let message = $message;
        let file = file!();
        let line = line!();
        let column = column!();
        panic!(
            "internal error in easyscan ({}:{}:{}):\n{}",
            file, line, column, message
        )
    }};
}
