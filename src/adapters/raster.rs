use crate::core::style::{Color, Hatch, LayerStyle, StylePreset};
use crate::domain::model::{FeatureKind, MapFeature, MapScene};
use crate::domain::ports::MapPlotter;
use crate::utils::error::{MapError, Result};
use geo::BoundingRect;
use geo_types::{Coord, LineString, Polygon, Rect};
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;
use std::io::Cursor;

/// 線寬以 600px 畫布為基準等比放大
const LINE_WIDTH_REFERENCE: f32 = 600.0;

const LAYER_ORDER: [FeatureKind; 4] = [
    FeatureKind::Water,
    FeatureKind::Green,
    FeatureKind::Forest,
    FeatureKind::Building,
];

/// 以 `image`/`imageproc` 將場景點陣化成正方形 PNG
#[derive(Debug, Clone, Copy)]
pub struct RasterPlotter {
    size: u32,
    margin: f64,
}

impl RasterPlotter {
    pub fn new(size: u32, margin: f64) -> Self {
        Self { size, margin }
    }

    fn line_px(&self, width: f32) -> f32 {
        width * self.size as f32 / LINE_WIDTH_REFERENCE
    }

    fn hatch_spacing(&self) -> u32 {
        (self.size / 60).max(6)
    }

    fn hatch_radius(&self) -> i32 {
        (self.size / 600).max(1) as i32
    }

    fn apply_hatch(&self, img: &mut RgbaImage, style: &LayerStyle) {
        let Some(Hatch::Dots) = style.hatch else {
            return;
        };

        let region = style.fill.to_rgba();
        let ink = style.edge.to_rgba();
        let spacing = self.hatch_spacing();
        let radius = self.hatch_radius();

        let mut row = 0;
        let mut y = spacing / 2;
        while y < img.height() {
            // 奇數列錯開半格
            let mut x = spacing / 2 + if row % 2 == 1 { spacing / 2 } else { 0 };
            while x < img.width() {
                if *img.get_pixel(x, y) == region {
                    draw_filled_circle_mut(img, (x as i32, y as i32), radius, ink);
                }
                x += spacing;
            }
            y += spacing;
            row += 1;
        }
    }

    fn draw_features(
        &self,
        layer: &mut RgbaImage,
        features: &[MapFeature],
        kind: FeatureKind,
        style: &StylePreset,
        projection: &Projection,
    ) {
        for feature in features.iter().filter(|f| f.kind == kind) {
            let (fill, edge, line_width) = match kind {
                FeatureKind::Water => (style.water.fill, style.water.edge, style.water.line_width),
                FeatureKind::Green => (style.green.fill, style.green.edge, style.green.line_width),
                FeatureKind::Forest => (style.forest.fill, style.forest.edge, style.forest.line_width),
                FeatureKind::Building => {
                    let palette = &style.building.palette;
                    (
                        palette[(feature.id % palette.len() as u64) as usize],
                        style.building.edge,
                        style.building.line_width,
                    )
                }
            };

            fill_exterior(layer, &feature.polygon, projection, fill.to_rgba());
            if line_width > 0.0 {
                stroke_polygon(layer, &feature.polygon, projection, self.line_px(line_width), edge);
            }
        }
    }
}

impl MapPlotter for RasterPlotter {
    fn plot(&self, scene: &MapScene, style: &StylePreset) -> Result<Vec<u8>> {
        let area = scene
            .boundary
            .bounding_rect()
            .ok_or_else(|| MapError::RenderError {
                message: "boundary is empty".to_string(),
            })?;
        let projection = Projection::fit(area, self.size, self.margin);

        let mut canvas = RgbaImage::from_pixel(self.size, self.size, style.background.fill.to_rgba());
        self.apply_hatch(&mut canvas, &style.background);

        let mask = boundary_mask(scene, &projection, self.size);

        // 邊界內的內容先畫在透明圖層，再依遮罩合成
        let mut layer = RgbaImage::new(self.size, self.size);
        for polygon in scene.boundary.0.iter() {
            fill_exterior(&mut layer, polygon, &projection, style.perimeter.fill.to_rgba());
        }
        for kind in LAYER_ORDER {
            self.draw_features(&mut layer, &scene.features, kind, style, &projection);
            if kind == FeatureKind::Water {
                self.apply_hatch(&mut layer, &style.water);
            }
        }
        composite(&mut canvas, &layer, &mask);

        let perimeter_px = self.line_px(style.perimeter.line_width);
        for polygon in scene.boundary.0.iter() {
            stroke_polygon(&mut canvas, polygon, &projection, perimeter_px, style.perimeter.edge);
        }

        encode_png(canvas)
    }
}

/// 等距圓柱投影，經度依中心緯度的 cos 修正
struct Projection {
    min_x: f64,
    max_y: f64,
    kx: f64,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Projection {
    fn fit(area: Rect<f64>, size: u32, margin: f64) -> Self {
        let kx = area.center().y.to_radians().cos().max(0.01);
        let width = area.width() * kx;
        let height = area.height();
        let usable = size as f64 * (1.0 - 2.0 * margin);
        let extent = width.max(height);
        let scale = if extent > 0.0 { usable / extent } else { 1.0 };

        Self {
            min_x: area.min().x,
            max_y: area.max().y,
            kx,
            scale,
            offset_x: (size as f64 - width * scale) / 2.0,
            offset_y: (size as f64 - height * scale) / 2.0,
        }
    }

    fn project(&self, coord: Coord<f64>) -> (f32, f32) {
        (
            (self.offset_x + (coord.x - self.min_x) * self.kx * self.scale) as f32,
            (self.offset_y + (self.max_y - coord.y) * self.scale) as f32,
        )
    }

    fn path(&self, ring: &LineString<f64>) -> Vec<(f32, f32)> {
        ring.coords().map(|c| self.project(*c)).collect()
    }

    /// imageproc 要求首尾不重複且至少三點
    fn polygon_points(&self, ring: &LineString<f64>) -> Option<Vec<Point<i32>>> {
        let mut points: Vec<Point<i32>> = Vec::with_capacity(ring.0.len());
        for coord in ring.coords() {
            let (x, y) = self.project(*coord);
            let point = Point::new(x.round() as i32, y.round() as i32);
            if points.last() != Some(&point) {
                points.push(point);
            }
        }
        while points.len() > 1 && points.first() == points.last() {
            points.pop();
        }

        if points.len() < 3 {
            None
        } else {
            Some(points)
        }
    }
}

fn boundary_mask(scene: &MapScene, projection: &Projection, size: u32) -> GrayImage {
    let mut mask = GrayImage::new(size, size);
    for polygon in scene.boundary.0.iter() {
        if let Some(points) = projection.polygon_points(polygon.exterior()) {
            draw_polygon_mut(&mut mask, &points, Luma([255]));
        }
        for hole in polygon.interiors() {
            if let Some(points) = projection.polygon_points(hole) {
                draw_polygon_mut(&mut mask, &points, Luma([0]));
            }
        }
    }
    mask
}

fn fill_exterior(img: &mut RgbaImage, polygon: &Polygon<f64>, projection: &Projection, color: Rgba<u8>) {
    if let Some(points) = projection.polygon_points(polygon.exterior()) {
        draw_polygon_mut(img, &points, color);
    }
}

fn stroke_polygon(
    img: &mut RgbaImage,
    polygon: &Polygon<f64>,
    projection: &Projection,
    width: f32,
    color: Color,
) {
    let color = color.to_rgba();
    for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
        for segment in projection.path(ring).windows(2) {
            stroke_segment(img, segment[0], segment[1], width, color);
        }
    }
}

fn stroke_segment(img: &mut RgbaImage, from: (f32, f32), to: (f32, f32), width: f32, color: Rgba<u8>) {
    if width <= 1.5 {
        draw_line_segment_mut(img, from, to, color);
        return;
    }

    // 粗線以沿線蓋圓點的方式近似
    let radius = (width / 2.0).round().max(1.0) as i32;
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let length = (dx * dx + dy * dy).sqrt();
    let step = (radius as f32 / 2.0).max(1.0);
    let steps = (length / step).ceil().max(1.0) as usize;

    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let center = (
            (from.0 + dx * t).round() as i32,
            (from.1 + dy * t).round() as i32,
        );
        draw_filled_circle_mut(img, center, radius, color);
    }
}

fn composite(canvas: &mut RgbaImage, layer: &RgbaImage, mask: &GrayImage) {
    for (x, y, pixel) in layer.enumerate_pixels() {
        if pixel[3] > 0 && mask.get_pixel(x, y)[0] > 0 {
            canvas.put_pixel(x, y, *pixel);
        }
    }
}

fn encode_png(canvas: RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(canvas).write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::style::{MINIMALIST, VINTAGE};
    use geo_types::MultiPolygon;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn square(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (min_x, min_y),
                (max_x, min_y),
                (max_x, max_y),
                (min_x, max_y),
                (min_x, min_y),
            ]),
            vec![],
        )
    }

    fn scene(features: Vec<MapFeature>) -> MapScene {
        MapScene {
            boundary: MultiPolygon::new(vec![square(0.0, 0.0, 1.0, 1.0)]),
            features,
        }
    }

    fn decode(png: &[u8]) -> RgbaImage {
        image::load_from_memory(png).unwrap().to_rgba8()
    }

    #[test]
    fn test_output_is_png_of_configured_size() {
        let png = RasterPlotter::new(200, 0.1).plot(&scene(vec![]), &MINIMALIST).unwrap();

        assert_eq!(&png[..8], &PNG_SIGNATURE);
        let img = decode(&png);
        assert_eq!(img.dimensions(), (200, 200));
    }

    #[test]
    fn test_perimeter_is_stroked_and_filled() {
        let img = decode(&RasterPlotter::new(200, 0.1).plot(&scene(vec![]), &MINIMALIST).unwrap());

        // 邊界左緣約在 x=20
        assert_eq!(*img.get_pixel(20, 100), MINIMALIST.perimeter.edge.to_rgba());
        assert_eq!(*img.get_pixel(60, 60), MINIMALIST.perimeter.fill.to_rgba());
        assert_eq!(*img.get_pixel(0, 0), MINIMALIST.background.fill.to_rgba());
    }

    #[test]
    fn test_buildings_use_palette_and_are_clipped() {
        let features = vec![
            MapFeature {
                id: 4,
                kind: FeatureKind::Building,
                polygon: square(0.5, 0.1, 0.9, 0.5),
            },
            MapFeature {
                id: 5,
                kind: FeatureKind::Building,
                polygon: square(0.8, 0.2, 1.3, 0.4),
            },
        ];
        let img = decode(&RasterPlotter::new(200, 0.1).plot(&scene(features), &VINTAGE).unwrap());

        assert_eq!(*img.get_pixel(132, 132), VINTAGE.building.palette[1].to_rgba());
        // 超出邊界的部分不畫
        assert_eq!(*img.get_pixel(196, 132), VINTAGE.background.fill.to_rgba());
    }

    #[test]
    fn test_empty_boundary_is_render_error() {
        let empty = MapScene {
            boundary: MultiPolygon::new(vec![]),
            features: vec![],
        };
        let err = RasterPlotter::new(100, 0.05).plot(&empty, &MINIMALIST).unwrap_err();
        assert!(matches!(err, MapError::RenderError { .. }));
    }
}
