/// Resolves stored image references into URLs served by the media storage.
#[derive(Debug, Clone, Default)]
pub struct MediaUrlService {
    base_url: Option<String>,
}

impl MediaUrlService {
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            base_url: base_url.map(|url| url.trim_end_matches('/').to_string()),
        }
    }

    pub fn public_url(&self, image_ref: &str) -> String {
        if image_ref.starts_with("http://") || image_ref.starts_with("https://") {
            return image_ref.to_string();
        }

        match &self.base_url {
            Some(base) => format!("{}/{}", base, image_ref.trim_start_matches('/')),
            None => image_ref.to_string(),
        }
    }
}
