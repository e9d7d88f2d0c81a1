//! Console messages for the user, kept apart from the tracing output on stderr.
//! Call sites need `colored::Colorize` in scope.

#[macro_export]
macro_rules! error_message {
    ($($arg:tt)*) => {
        eprintln!("{} {}", "  [ERROR]".red().bold(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! warning_message {
    ($($arg:tt)*) => {
        eprintln!("{} {}", "[WARNING]".yellow().bold(), format!($($arg)*));
    };
}
