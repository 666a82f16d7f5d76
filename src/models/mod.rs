mod event;
mod exercise_template;
mod set_type;
mod workout;

pub use event::ChangeEvent;
pub use exercise_template::ExerciseTemplate;
pub use set_type::SetType;
pub use workout::{Exercise, Workout, WorkoutFields, WorkoutSet};
