pub use crate::error::{UploadError, UploadResult};
pub use crate::{end_group, start_group};
#[allow(unused_imports)]
pub use log::{debug, error, info, trace, warn};
