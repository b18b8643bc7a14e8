// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Detection of the texture formats the running build can decode.

use async_trait::async_trait;
use image::ImageFormat;

/// Probes support for one family of formats.
///
/// Detections narrow the preferred format list before it becomes a
/// preference rule: a supported format is added, an unsupported one removed.
#[async_trait]
pub trait FormatDetectionParser: Send + Sync + 'static {
    /// Is the format family supported?
    async fn test(&self) -> bool;

    /// Adds the extensions of the family to `formats`, keeping existing order.
    fn add(&self, formats: &mut Vec<String>);

    /// Removes the extensions of the family from `formats`.
    fn remove(&self, formats: &mut Vec<String>);
}

/// Reports an image format as supported when a decoder for it is linked in.
#[derive(Debug, Clone, Copy)]
pub struct ImageCodecDetection {
    format: ImageFormat,
}

impl ImageCodecDetection {
    /// Creates a detection for `format`.
    pub fn new(format: ImageFormat) -> Self {
        Self { format }
    }

    /// Detections for the formats a texture preference usually names.
    pub fn defaults() -> Vec<Self> {
        [
            ImageFormat::Avif,
            ImageFormat::WebP,
            ImageFormat::Png,
            ImageFormat::Jpeg,
        ]
        .into_iter()
        .map(Self::new)
        .collect()
    }

    fn extensions(&self) -> &'static [&'static str] {
        self.format.extensions_str()
    }
}

#[async_trait]
impl FormatDetectionParser for ImageCodecDetection {
    async fn test(&self) -> bool {
        self.format.reading_enabled()
    }

    fn add(&self, formats: &mut Vec<String>) {
        for extension in self.extensions() {
            if !formats.iter().any(|format| format == extension) {
                formats.push(extension.to_string());
            }
        }
    }

    fn remove(&self, formats: &mut Vec<String>) {
        let extensions = self.extensions();
        formats.retain(|format| !extensions.contains(&format.as_str()));
    }
}

/// Narrows `preferred` to the formats the detections report as supported.
///
/// Formats no detection knows about are kept. The result has no duplicates
/// and keeps the first occurrence of each format.
pub async fn detect_formats(
    preferred: &[String],
    detections: &[std::sync::Arc<dyn FormatDetectionParser>],
) -> Vec<String> {
    let mut formats = preferred.to_vec();
    for detection in detections {
        if detection.test().await {
            detection.add(&mut formats);
        } else {
            detection.remove(&mut formats);
        }
    }

    let mut seen = std::collections::HashSet::new();
    formats.retain(|format| seen.insert(format.clone()));
    formats
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Never(&'static str);

    #[async_trait]
    impl FormatDetectionParser for Never {
        async fn test(&self) -> bool {
            false
        }

        fn add(&self, formats: &mut Vec<String>) {
            formats.push(self.0.to_string());
        }

        fn remove(&self, formats: &mut Vec<String>) {
            formats.retain(|format| format != self.0);
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[tokio::test]
    async fn unsupported_formats_are_removed() {
        let detections: Vec<Arc<dyn FormatDetectionParser>> = vec![Arc::new(Never("avif"))];
        let formats = detect_formats(&strings(&["avif", "webp", "png", "webp"]), &detections).await;
        assert_eq!(formats, ["webp", "png"]);
    }

    #[tokio::test]
    async fn png_decoding_is_linked_in() {
        let detection: Arc<dyn FormatDetectionParser> =
            Arc::new(ImageCodecDetection::new(ImageFormat::Png));
        assert!(detection.test().await);

        let formats = detect_formats(&strings(&["webp"]), &[detection]).await;
        assert_eq!(formats, ["webp", "png"]);
    }

    #[test]
    fn jpeg_covers_both_extensions() {
        let detection = ImageCodecDetection::new(ImageFormat::Jpeg);
        let mut formats = strings(&["jpg", "png", "jpeg"]);
        detection.remove(&mut formats);
        assert_eq!(formats, ["png"]);
    }
}
