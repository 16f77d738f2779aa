pub mod catalog;
pub mod descriptor;
pub mod error;
pub mod locator;
pub mod resolver;
pub mod store;
pub mod walk;

pub use catalog::{
    page_resources, resource_templates, ResourceCatalog, ResourceDescriptor, ResourceMeta,
    ResourcePage, ResourceTemplate,
};
pub use descriptor::{compute_etag, ArtifactContent, ArtifactDescriptor, FileStamp};
pub use error::{ArtifactError, ErrorKind};
pub use locator::{
    classify_file_name, ArtifactFormat, ArtifactKind, CodeLanguage, Locator, LOCATOR_SCHEME,
};
pub use resolver::WorkflowDirResolver;
pub use store::{check_precondition, ArtifactStore, ResourceText, ResourceWriteResult};
pub use walk::{DirectoryWalk, WalkEntry, WalkedDir};
