pub(crate) mod download;
pub(crate) mod gallery;
pub(crate) mod job;

pub use download::{DirDownloader, Downloader};
pub use gallery::{Gallery, GalleryItem, InMemoryGallery};
pub use job::{CancelToken, GeneratedImage, GenerationJob, GenerationRequest, ImageGenerator, run_job};
