use std::io::Cursor;

use axum::body::Body;
use axum::http::header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::Response;
use tracing::debug;

use super::load_state;
use super::prelude::*;

/// Serves image `index` from the session as a JPEG attachment.
pub(crate) async fn download_handler(
    session: Session,
    Path(index): Path<usize>,
) -> Result<Response, PostsmithError> {
    let state = load_state(&session).await?;
    let Some(image) = state.image(index) else {
        return Err(PostsmithError::NotFound(format!("image {index}")));
    };
    let bytes = image.decode().map_err(|err| {
        error!("Stored image {index} is not valid base64: {err}");
        PostsmithError::InternalServerError(err.to_string())
    })?;
    let jpeg = to_jpeg(&bytes)?;

    Response::builder()
        .header(CONTENT_TYPE, "image/jpeg")
        .header(
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"image_{}.jpg\"", index + 1),
        )
        .header(CACHE_CONTROL, "no-store")
        .body(Body::from(jpeg))
        .map_err(PostsmithError::from)
}

/// Re-encodes any supported image as JPEG, dropping transparency.
pub(crate) fn to_jpeg(bytes: &[u8]) -> Result<Vec<u8>, PostsmithError> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|err| {
            debug!("Failed to guess image format: {}", err);
            PostsmithError::BadRequest
        })?;
    let format = reader.format();
    let decoded = reader.decode().map_err(|err| {
        debug!("Failed to decode image: {}", err);
        PostsmithError::BadRequest
    })?;

    if format == Some(image::ImageFormat::Jpeg) {
        return Ok(bytes.to_vec());
    }

    let rgb = image::DynamicImage::ImageRgb8(decoded.to_rgb8());
    let mut output = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new(&mut output);
    encoder
        .encode_image(&rgb)
        .map_err(|err| PostsmithError::InternalServerError(err.to_string()))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_png() -> Vec<u8> {
        let pixels = image::RgbaImage::from_pixel(4, 4, image::Rgba([30, 90, 200, 128]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(pixels)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode png");
        bytes
    }

    #[test]
    fn png_becomes_jpeg() {
        let jpeg = to_jpeg(&tiny_png()).expect("convert");
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        assert_eq!(
            image::guess_format(&jpeg).expect("guess format"),
            image::ImageFormat::Jpeg
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(to_jpeg(&[]).is_err());
        assert!(to_jpeg(&[0xFF, 0xD8, 0x00, 0xFF, 0xD9]).is_err());
        assert!(to_jpeg(b"This is not an image.").is_err());
    }
}
