// timetable-core: Paging engine, domain model and list-screen state between timetable-api and consumers.

pub mod backend;
pub mod config;
pub mod convert;
pub mod error;
pub mod event;
pub mod loading;
pub mod model;
pub mod paging;
pub mod repository;
pub mod stream;
pub mod view_model;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::Backend;
pub use config::BackendConfig;
pub use error::{CoreError, ErrorKind};
pub use event::{EventId, EventStream, UiEvent, UiEventManager};
pub use loading::{LoaderGuard, LoadingStream, ObservableLoadingCounter, with_loader};
pub use paging::{
    Cursor, Identified, LoadState, LoadStatus, Page, PageFetcher, PageRequest, PageResult, Pager,
    PagerConfig, PagerPhase, PagingSnapshot, PagingSource, PagingState, PagingStream,
    RefreshPolicy, ResourceFetcher, SourceId,
};
pub use repository::Repository;
pub use stream::{Subscription, SubscriptionStream};
pub use view_model::{TableDialog, TableEvent, TableViewModel};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    AccessKey, Change, Classroom, Course, Discipline, Entity, EntityId, Group, Lesson, ScheduleItem,
    Subject, Teacher, User, UserOwner, WeekAlternation,
};
