//! Repository layer: one unit struct per aggregate with static async
//! methods.
//!
//! Read paths take `&PgPool`; methods that participate in a multi-statement
//! transaction take `&mut PgConnection` so services can compose them inside
//! one `pool.begin()` scope.

pub mod enrollment_repo;
pub mod lesson_repo;
pub mod locker_repo;
pub mod payment_repo;
pub mod user_repo;

pub use enrollment_repo::EnrollmentRepo;
pub use lesson_repo::LessonRepo;
pub use locker_repo::LockerRepo;
pub use payment_repo::PaymentRepo;
pub use user_repo::UserRepo;
