use std::sync::{Arc, RwLock};

use crate::models::ImageMap;

/// Shared name -> image URL mapping.
///
/// Writers swap the whole map; readers hold an `Arc` to whichever complete
/// map was current when they asked, so nobody can observe a half-applied
/// refresh.
#[derive(Clone, Default)]
pub struct ImageCache {
    inner: Arc<RwLock<Arc<ImageMap>>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<ImageMap> {
        match self.inner.read() {
            Ok(guard) => Arc::clone(&*guard),
            // A writer only ever stores a complete map, so a poisoned lock
            // still holds a usable one
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    pub fn replace(&self, images: ImageMap) {
        let images = Arc::new(images);
        match self.inner.write() {
            Ok(mut guard) => *guard = images,
            Err(poisoned) => *poisoned.into_inner() = images,
        }
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }
}
