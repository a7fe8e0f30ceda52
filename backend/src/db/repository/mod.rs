//! Repository trait definitions for calendar storage.
//!
//! Responsibilities are split across focused traits so that implementations
//! stay small and testable.
//!
//! # Module Organization
//!
//! - [`error`]: Error types for repository operations
//! - [`template`]: Templates and the active-template pointer
//! - [`curriculum`]: Curriculum plans and their entries
//! - [`occurrence`]: Read access to dated lesson occurrences
//! - [`transaction`]: Atomic units of work used by every mutating service
//!
//! # Convenience Trait Bound
//!
//! For functions that need all repository capabilities, use the
//! [`FullRepository`] trait bound:
//!
//! ```ignore
//! async fn my_service<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<()> {
//!     let mut tx = repo.begin().await?;
//!     tx.delete_generated_from(from).await?;
//!     tx.commit().await
//! }
//! ```

pub mod curriculum;
pub mod error;
pub mod occurrence;
pub mod template;
pub mod transaction;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

pub use curriculum::CurriculumRepository;
pub use occurrence::OccurrenceRepository;
pub use template::TemplateRepository;
pub use transaction::{CalendarTransaction, TransactionalRepository};

/// Composite trait bound for a complete repository implementation.
///
/// Automatically implemented for any type that implements all four
/// repository traits.
pub trait FullRepository:
    TemplateRepository + CurriculumRepository + OccurrenceRepository + TransactionalRepository
{
}

impl<T> FullRepository for T where
    T: TemplateRepository + CurriculumRepository + OccurrenceRepository + TransactionalRepository
{
}
