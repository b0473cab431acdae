pub mod sys;

mod control;
pub use self::control::Utun;
