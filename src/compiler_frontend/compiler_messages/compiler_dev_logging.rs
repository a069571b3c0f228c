// AST LOGGING MACROS
#[macro_export]
#[cfg(feature = "show_ast")]
macro_rules! ast_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_ast"))]
macro_rules! ast_log {
    ($($arg:tt)*) => {
        // Nothing
    };
}

// Extra timer logging
#[macro_export]
#[cfg(feature = "detailed_timers")]
macro_rules! timer_log {
    ($time:expr, $msg:expr) => {
        saying::say!($msg, Green #$time.elapsed());
    };
}

#[macro_export]
#[cfg(not(feature = "detailed_timers"))]
macro_rules! timer_log {
    ($time:expr, $msg:expr) => {
        // Nothing
    };
}

// ANNOTATION DESUGARING LOGGING MACROS
#[macro_export]
#[cfg(feature = "show_annotations")]
macro_rules! annotation_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_annotations"))]
macro_rules! annotation_log {
    ($($arg:tt)*) => {
        // Nothing
    };
}

// OPTIMIZER LOGGING MACROS
#[macro_export]
#[cfg(feature = "show_optimizer")]
macro_rules! optimizer_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_optimizer"))]
macro_rules! optimizer_log {
    ($($arg:tt)*) => {
        // Nothing
    };
}

// ASSUMPTION TRACKING LOGGING MACROS
#[macro_export]
#[cfg(feature = "show_assumptions")]
macro_rules! assumption_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_assumptions"))]
macro_rules! assumption_log {
    ($($arg:tt)*) => {
        // Nothing
    };
}
