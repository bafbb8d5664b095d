pub mod color;
pub mod event;
pub mod outcome;
pub mod record;
pub mod spec;
pub mod stop;

pub use color::Color;
pub use event::{EventQueue, EventSource, InputEvent};
pub use outcome::{TrialOutcome, UnitOutcome};
pub use record::{TrialRecord, RECORD_HEADER};
pub use spec::TrialSpec;
pub use stop::StopCondition;
