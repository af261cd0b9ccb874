// 图片转换器 - 解码、缩放、编码
//
// 本模块提供 JPEG 图片的转换功能，包括：
// - 解码（只支持 JPEG 一种编解码格式）
// - 按目标宽高缩放（Lanczos3 滤波，固定不可配置），输出像素数有上限
// - 重新编码为 JPEG
// - 在阻塞线程池中执行缩放，并通过一次性通道交回结果

use crate::services::resize::error::TransformError;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, GenericImageView, ImageFormat};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task;

/// 默认 JPEG 编码质量
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// 默认输出像素上限（8192 x 8192）
pub const DEFAULT_MAX_OUTPUT_PIXELS: u64 = 8192 * 8192;

/// 缩放任务
///
/// 由调度器创建，交给独立的阻塞任务执行，结果只被创建者读取一次。
#[derive(Debug)]
pub struct TransformTask {
    pub width: u32,
    pub height: u32,
    pub image: DynamicImage,
}

/// 图片转换能力
pub trait ImageTransformer: Send + Sync {
    /// 解码原始字节
    fn decode(&self, data: &[u8]) -> Result<DynamicImage, TransformError>;

    /// 缩放到目标尺寸（宽或高为 0 时按原始宽高比推导）
    ///
    /// 目标像素数超过上限时返回 [`TransformError::TooLarge`]，不分配输出缓冲区。
    fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> Result<DynamicImage, TransformError>;

    /// 编码为输出字节
    fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>, TransformError>;

    /// 解码 -> 缩放 -> 编码，全部在当前线程执行
    fn transform(&self, data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, TransformError> {
        let image = self.decode(data)?;
        let resized = self.resize(&image, width, height)?;
        self.encode(&resized)
    }
}

/// JPEG 转换器
#[derive(Debug, Clone)]
pub struct JpegTransformer {
    quality: u8,
    max_pixels: u64,
}

impl JpegTransformer {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            max_pixels: DEFAULT_MAX_OUTPUT_PIXELS,
        }
    }

    /// 设置输出像素上限
    pub fn with_max_pixels(mut self, max_pixels: u64) -> Self {
        self.max_pixels = max_pixels;
        self
    }
}

impl Default for JpegTransformer {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl ImageTransformer for JpegTransformer {
    fn decode(&self, data: &[u8]) -> Result<DynamicImage, TransformError> {
        image::load_from_memory_with_format(data, ImageFormat::Jpeg)
            .map_err(|e| TransformError::Decode(format!("JPEG 解码失败: {}", e)))
    }

    fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> Result<DynamicImage, TransformError> {
        let (src_width, src_height) = image.dimensions();
        let (width, height) = target_dimensions(src_width, src_height, width, height);

        // 必须在分配之前检查，超大分配失败会直接终止进程
        if width as u64 * height as u64 > self.max_pixels {
            return Err(TransformError::TooLarge {
                width,
                height,
                limit: self.max_pixels,
            });
        }

        if (width, height) == (src_width, src_height) {
            return Ok(image.clone());
        }

        Ok(image.resize_exact(width, height, FilterType::Lanczos3))
    }

    fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>, TransformError> {
        // JPEG 不支持透明通道，统一转成 RGB8
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        let mut buffer = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, self.quality);
        encoder
            .encode(rgb.as_raw(), width, height, ColorType::Rgb8)
            .map_err(|e| TransformError::Encode(format!("JPEG 编码失败: {}", e)))?;

        Ok(buffer)
    }
}

/// 计算目标尺寸
///
/// - 宽高都非 0：精确使用请求尺寸，不保持宽高比
/// - 其中一个为 0：按原始宽高比推导，四舍五入，最小为 1
/// - 都为 0：保持原始尺寸
pub fn target_dimensions(src_width: u32, src_height: u32, width: u32, height: u32) -> (u32, u32) {
    match (width, height) {
        (0, 0) => (src_width, src_height),
        (0, h) => {
            let w = (src_width as f64 * h as f64 / src_height.max(1) as f64).round() as u32;
            (w.max(1), h)
        }
        (w, 0) => {
            let h = (src_height as f64 * w as f64 / src_width.max(1) as f64).round() as u32;
            (w, h.max(1))
        }
        (w, h) => (w, h),
    }
}

/// 在阻塞线程池中执行缩放
///
/// 返回的接收端是该任务结果的唯一读取方。接收端被丢弃时（例如等待超时），
/// 缩放仍会完成，结果被直接丢弃。
pub fn spawn_resize(
    transformer: Arc<dyn ImageTransformer>,
    task: TransformTask,
) -> oneshot::Receiver<Result<DynamicImage, TransformError>> {
    let (tx, rx) = oneshot::channel();

    task::spawn_blocking(move || {
        let resized = transformer.resize(&task.image, task.width, task.height);
        let _ = tx.send(resized);
    });

    rx
}

/// 等待缩放任务的结果
pub async fn await_resize(
    rx: oneshot::Receiver<Result<DynamicImage, TransformError>>,
) -> Result<DynamicImage, TransformError> {
    rx.await
        .map_err(|_| TransformError::TaskFailed("缩放任务未返回结果".to_string()))?
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// 创建测试用的 JPEG 数据
    pub(crate) fn create_test_jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 30, 30])));
        JpegTransformer::default().encode(&img).unwrap()
    }

    #[test]
    fn test_target_dimensions() {
        assert_eq!(target_dimensions(200, 100, 100, 0), (100, 50));
        assert_eq!(target_dimensions(200, 100, 0, 50), (100, 50));
        assert_eq!(target_dimensions(200, 100, 30, 70), (30, 70));
        assert_eq!(target_dimensions(200, 100, 0, 0), (200, 100));
        // 300 * 7 / 200 = 10.5 -> 11
        assert_eq!(target_dimensions(300, 200, 0, 7), (11, 7));
        assert_eq!(target_dimensions(1000, 1, 1, 0), (1, 1));
    }

    #[test]
    fn test_resize_height_only_keeps_aspect_ratio() {
        let transformer = JpegTransformer::default();
        let image = transformer.decode(&create_test_jpeg(200, 100)).unwrap();
        let resized = transformer.resize(&image, 0, 40).unwrap();
        assert_eq!(resized.dimensions(), (80, 40));
    }

    #[test]
    fn test_resize_exact_ignores_aspect_ratio() {
        let transformer = JpegTransformer::default();
        let image = transformer.decode(&create_test_jpeg(200, 100)).unwrap();
        let resized = transformer.resize(&image, 37, 91).unwrap();
        assert_eq!(resized.dimensions(), (37, 91));
    }

    #[test]
    fn test_transform_round_trip_dimensions() {
        let transformer = JpegTransformer::default();
        let output = transformer.transform(&create_test_jpeg(200, 100), 100, 0).unwrap();

        // 输出为 JPEG（SOI 标记）
        assert_eq!(&output[0..2], &[0xFF, 0xD8]);
        let decoded = transformer.decode(&output).unwrap();
        assert_eq!(decoded.dimensions(), (100, 50));
    }

    #[test]
    fn test_resize_rejects_oversized_output() {
        let transformer = JpegTransformer::default();
        let image = transformer.decode(&create_test_jpeg(4, 2)).unwrap();

        let result = transformer.resize(&image, u32::MAX, u32::MAX);
        assert!(matches!(
            result,
            Err(TransformError::TooLarge { width: u32::MAX, height: u32::MAX, .. })
        ));

        // 单边推导出的尺寸同样受限
        let result = transformer.resize(&image, 0, 100_000);
        assert!(matches!(result, Err(TransformError::TooLarge { .. })));
    }

    #[test]
    fn test_resize_at_custom_limit() {
        let transformer = JpegTransformer::default().with_max_pixels(100);
        let image = transformer.decode(&create_test_jpeg(40, 20)).unwrap();

        assert_eq!(transformer.resize(&image, 10, 10).unwrap().dimensions(), (10, 10));
        assert!(matches!(
            transformer.resize(&image, 10, 11),
            Err(TransformError::TooLarge { limit: 100, .. })
        ));
        assert!(transformer.transform(&create_test_jpeg(40, 20), 20, 20).is_err());
    }

    #[test]
    fn test_decode_invalid_data() {
        let transformer = JpegTransformer::default();
        let result = transformer.decode(b"definitely not a jpeg");
        assert!(matches!(result, Err(TransformError::Decode(_))));

        let result = transformer.decode(&[]);
        assert!(matches!(result, Err(TransformError::Decode(_))));
    }

    #[test]
    fn test_decode_truncated_jpeg() {
        let transformer = JpegTransformer::default();
        let data = create_test_jpeg(64, 64);
        let result = transformer.decode(&data[..20]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_spawn_resize_hands_back_result() {
        let transformer: Arc<dyn ImageTransformer> = Arc::new(JpegTransformer::default());
        let image = transformer.decode(&create_test_jpeg(120, 60)).unwrap();

        let rx = spawn_resize(
            Arc::clone(&transformer),
            TransformTask {
                width: 60,
                height: 0,
                image,
            },
        );
        let resized = await_resize(rx).await.unwrap();
        assert_eq!(resized.dimensions(), (60, 30));
    }
}
