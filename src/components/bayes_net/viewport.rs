use super::types::Point;

/// Blank margin around the drawing when fitted, in screen pixels.
pub const PADDING: f64 = 25.0;
pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 8.0;
/// Pointer travel below which a press/release still counts as a click.
pub const CLICK_SLOP: f64 = 4.0;

/// Screen = world * k + (x, y).
#[derive(Clone, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}
}

impl ViewTransform {
	pub fn to_world(&self, screen: Point) -> Point {
		Point::new((screen.x - self.x) / self.k, (screen.y - self.y) / self.k)
	}

	pub fn to_screen(&self, world: Point) -> Point {
		Point::new(world.x * self.k + self.x, world.y * self.k + self.y)
	}
}

#[derive(Clone, Debug)]
struct PanState {
	start: Point,
	transform_start: (f64, f64),
	moved: bool,
}

/// Canvas size, the pan/zoom transform over the drawing, and the pointer
/// gesture in progress.
#[derive(Clone, Debug)]
pub struct Viewport {
	pub width: f64,
	pub height: f64,
	pub transform: ViewTransform,
	content: (f64, f64),
	fit_k: f64,
	pan: Option<PanState>,
}

impl Viewport {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			width,
			height,
			transform: ViewTransform::default(),
			content: (0.0, 0.0),
			fit_k: 1.0,
			pan: None,
		}
	}

	/// Centers a `content_width` × `content_height` drawing and scales it to
	/// fill the canvas, zoom reset.
	pub fn fit(&mut self, content_width: f64, content_height: f64) {
		self.content = (content_width, content_height);
		let avail = (self.width - 2.0 * PADDING, self.height - 2.0 * PADDING);
		self.fit_k = if content_width > 0.0 && content_height > 0.0 {
			(avail.0 / content_width).min(avail.1 / content_height).max(0.01)
		} else {
			1.0
		};
		self.transform = ViewTransform {
			x: (self.width - content_width * self.fit_k) / 2.0,
			y: (self.height - content_height * self.fit_k) / 2.0,
			k: self.fit_k,
		};
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		let (w, h) = self.content;
		self.fit(w, h);
	}

	/// Zoom relative to the fitted scale.
	pub fn zoom(&self) -> f64 {
		self.transform.k / self.fit_k
	}

	/// Scales by `factor` around a screen point, keeping it fixed.
	pub fn zoom_at(&mut self, screen: Point, factor: f64) {
		let zoom = (self.zoom() * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let k = self.fit_k * zoom;
		let ratio = k / self.transform.k;
		self.transform.x = screen.x - (screen.x - self.transform.x) * ratio;
		self.transform.y = screen.y - (screen.y - self.transform.y) * ratio;
		self.transform.k = k;
	}

	pub fn to_world(&self, screen: Point) -> Point {
		self.transform.to_world(screen)
	}

	pub fn press(&mut self, screen: Point) {
		self.pan = Some(PanState {
			start: screen,
			transform_start: (self.transform.x, self.transform.y),
			moved: false,
		});
	}

	pub fn is_pressed(&self) -> bool {
		self.pan.is_some()
	}

	/// Pans with the pointer while pressed. Returns whether the view moved.
	pub fn drag(&mut self, screen: Point) -> bool {
		let Some(pan) = &mut self.pan else {
			return false;
		};
		if !pan.moved && pan.start.distance(screen) < CLICK_SLOP {
			return false;
		}
		pan.moved = true;
		self.transform.x = pan.transform_start.0 + (screen.x - pan.start.x);
		self.transform.y = pan.transform_start.1 + (screen.y - pan.start.y);
		true
	}

	/// Ends the gesture. A release that never turned into a pan is a click,
	/// returned in world coordinates.
	pub fn release(&mut self, screen: Point) -> Option<Point> {
		let pan = self.pan.take()?;
		if pan.moved || pan.start.distance(screen) >= CLICK_SLOP {
			return None;
		}
		Some(self.to_world(screen))
	}

	pub fn cancel(&mut self) {
		self.pan = None;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn fitted() -> Viewport {
		let mut v = Viewport::new(450.0, 250.0);
		v.fit(200.0, 100.0);
		v
	}

	#[test]
	fn fit_centers_and_pads() {
		let v = fitted();
		assert_eq!(v.transform.k, 2.0);
		assert_eq!(v.transform.to_screen(Point::new(0.0, 0.0)), Point::new(25.0, 25.0));
		assert_eq!(v.transform.to_screen(Point::new(200.0, 100.0)), Point::new(425.0, 225.0));
		assert_eq!(v.zoom(), 1.0);
	}

	#[test]
	fn zoom_is_clamped_and_keeps_pointer_fixed() {
		let mut v = fitted();
		let pointer = Point::new(100.0, 80.0);
		let under = v.to_world(pointer);
		v.zoom_at(pointer, 1.5);
		let after = v.to_world(pointer);
		assert!((under.x - after.x).abs() < 1e-9 && (under.y - after.y).abs() < 1e-9);

		v.zoom_at(pointer, 100.0);
		assert_eq!(v.zoom(), MAX_ZOOM);
		v.zoom_at(pointer, 0.001);
		assert_eq!(v.zoom(), MIN_ZOOM);
	}

	#[test]
	fn short_press_is_a_click() {
		let mut v = fitted();
		v.press(Point::new(125.0, 125.0));
		assert!(!v.drag(Point::new(126.0, 126.0)));
		assert_eq!(v.release(Point::new(126.0, 125.0)), Some(Point::new(50.5, 50.0)));
		assert!(!v.is_pressed());
	}

	#[test]
	fn drag_pans_and_is_not_a_click() {
		let mut v = fitted();
		v.press(Point::new(100.0, 100.0));
		assert!(v.drag(Point::new(130.0, 90.0)));
		assert_eq!((v.transform.x, v.transform.y), (55.0, 15.0));
		// Back near the start point is still a pan.
		v.drag(Point::new(101.0, 100.0));
		assert_eq!(v.release(Point::new(101.0, 100.0)), None);
	}

	#[test]
	fn empty_content_keeps_unit_scale() {
		let mut v = Viewport::new(300.0, 200.0);
		v.fit(0.0, 0.0);
		assert_eq!(v.transform.k, 1.0);
	}
}
