pub mod spinner;

pub use spinner::WaitingSpinner;
