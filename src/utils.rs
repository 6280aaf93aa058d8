use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat, ImageReader};

use crate::error::RecognizeError;

/// 已解码的图片
///
/// 同时保留原始字节，远程嵌入服务需要原始文件内容
#[derive(Debug, Clone)]
pub struct ImageData {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub image: DynamicImage,
}

impl ImageData {
    /// 从内存解码图片，格式根据文件头猜测
    pub fn decode(bytes: Vec<u8>) -> image::ImageResult<Self> {
        let reader = ImageReader::new(Cursor::new(&bytes)).with_guessed_format()?;
        let format = reader.format().ok_or_else(|| {
            image::ImageError::Unsupported(image::error::UnsupportedError::from_format_and_kind(
                image::error::ImageFormatHint::Unknown,
                image::error::UnsupportedErrorKind::Format(image::error::ImageFormatHint::Unknown),
            ))
        })?;
        let image = reader.decode()?;
        Ok(Self { bytes, format, image })
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}

/// 去掉 `data:image/png;base64,` 这类前缀，只保留 base64 部分
pub fn strip_data_url(payload: &str) -> &str {
    let payload = payload.trim();
    match payload.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or(""),
        None => payload,
    }
}

/// 解码请求中的 base64 图片数据
pub fn decode_base64_image(payload: &str) -> Result<Vec<u8>, RecognizeError> {
    let data = strip_data_url(payload);
    if data.is_empty() {
        return Err(RecognizeError::InvalidInput("empty image data".to_string()));
    }
    STANDARD
        .decode(data)
        .map_err(|e| RecognizeError::InvalidInput(format!("malformed base64: {e}")))
}
