//! Glance (image service) calls

use super::client::{join, OpenStack};
use osctl_core::{ControlPlaneError, IdRef, ImageRef, Result};
use serde::Deserialize;

/// Glance tag carried by amphora images
pub const AMPHORA_IMAGE_TAG: &str = "amphora";

#[derive(Deserialize)]
struct ImagesBody {
    images: Vec<IdRef>,
}

impl OpenStack {
    /// Most recently created image tagged `amphora`
    pub async fn latest_amphora_image(&self) -> Result<ImageRef> {
        let url = join(&self.endpoints().glance, "v2/images");
        let query = [
            ("tag", AMPHORA_IMAGE_TAG),
            ("sort", "created_at:desc"),
            ("limit", "1"),
        ];
        let body: ImagesBody = self.get_with_query(&url, &query).await?;
        first_image(body)
    }
}

fn first_image(body: ImagesBody) -> Result<ImageRef> {
    body.images
        .into_iter()
        .next()
        .map(|image| ImageRef::new(image.id))
        .ok_or_else(|| ControlPlaneError::NotFound("cannot find amphora image".to_string()))
}
