use std::error::Error;

pub type GenericError = Box<dyn Error + Send + Sync>;
pub type GenericResult<T> = Result<T, GenericError>;
pub type EmptyResult = GenericResult<()>;

macro_rules! Err {
    ($($arg:tt)*) => (::std::result::Result::Err(format!($($arg)*).into()))
}
