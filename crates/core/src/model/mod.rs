mod ids;
mod progress;

pub use ids::{IdParseError, LessonId, ModuleId, QuizId};
pub use progress::{ProgressModelError, QuizScore, UserProgress};
