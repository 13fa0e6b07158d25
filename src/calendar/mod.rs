pub mod clock;
pub mod controller;
pub mod month;
pub mod projector;
pub mod range;
pub mod validator;

pub use clock::{Clock, FixedClock, SystemClock};
pub use controller::{CalendarController, Interaction};
pub use month::YearMonth;
pub use projector::{project_month, Availability, BookingInfo, DayCell, DayState, MonthView};
pub use range::DateRange;
pub use validator::{is_day_selectable, validate_range, validate_stay_length, Rejection};
