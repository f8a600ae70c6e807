pub mod appsettings;
pub mod clock;
pub mod reminder;
pub mod scheduling;
pub mod storage;
