pub mod booking;
pub mod calendar;
pub mod clock;
pub mod date_key;
pub mod gateway;
pub mod poller;
pub mod selection;
