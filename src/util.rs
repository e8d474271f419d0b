/// Unwraps an optional value or early return.
#[macro_export]
macro_rules! pick {
    ($expr:expr $(,)?) => {
        match $expr {
            Some(val) => val,
            None => {
                return;
            }
        }
    };
}
