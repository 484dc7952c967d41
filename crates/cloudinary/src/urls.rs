//! Delivery URL rewrites.

/// Transformation applied to history thumbnails.
pub const THUMBNAIL_TRANSFORM: &str = "w_200,h_200,c_fill,f_webp";

/// Same asset delivered as WebP (Cloudinary converts on the fly).
pub fn webp_url(secure_url: &str) -> String {
    let (base, file) = match secure_url.rsplit_once('/') {
        Some((base, file)) => (Some(base), file),
        None => (None, secure_url),
    };
    let stem = match file.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => file,
    };
    match base {
        Some(base) => format!("{base}/{stem}.webp"),
        None => format!("{stem}.webp"),
    }
}

/// 200x200 cropped WebP thumbnail of the asset.
pub fn thumbnail_url(secure_url: &str) -> String {
    secure_url.replacen("/upload/", &format!("/upload/{THUMBNAIL_TRANSFORM}/"), 1)
}
