use std::fmt;
use std::str::FromStr;

use super::types::{Group, Label, MarkovRole};

/// d3's `schemeSet3`, indexed by stage rank.
const STAGE_COLORS: &[Rgb] = &[
	Rgb(0x8d, 0xd3, 0xc7),
	Rgb(0xff, 0xff, 0xb3),
	Rgb(0xbe, 0xba, 0xda),
	Rgb(0xfb, 0x80, 0x72),
	Rgb(0x80, 0xb1, 0xd3),
	Rgb(0xfd, 0xb4, 0x62),
	Rgb(0xb3, 0xde, 0x69),
	Rgb(0xfc, 0xcd, 0xe5),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const BLACK: Rgb = Rgb(0, 0, 0);
pub const WHITE: Rgb = Rgb(0xff, 0xff, 0xff);
pub const GREY: Rgb = Rgb(0x80, 0x80, 0x80);

impl Rgb {
	/// d3's `color.darker(1)`.
	pub fn darker(self) -> Self {
		let k = 0.7;
		let scale = |c: u8| (c as f64 * k).round() as u8;
		Rgb(scale(self.0), scale(self.1), scale(self.2))
	}

	pub fn css(self) -> String {
		format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
	}

	pub fn css_alpha(self, alpha: f64) -> String {
		format!("rgba({}, {}, {}, {})", self.0, self.1, self.2, alpha.clamp(0.0, 1.0))
	}
}

/// How nodes and wedges are colored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorScheme {
	/// Colorful wedges, white node bodies.
	#[default]
	Probability,
	/// Grey wedges, node bodies colored by stage.
	Group,
}

impl ColorScheme {
	pub const ALL: [ColorScheme; 2] = [ColorScheme::Probability, ColorScheme::Group];

	pub fn as_str(self) -> &'static str {
		match self {
			ColorScheme::Probability => "prob",
			ColorScheme::Group => "group",
		}
	}

	pub fn caption(self) -> &'static str {
		match self {
			ColorScheme::Probability => "Colorful Probabilities",
			ColorScheme::Group => "Colorful Groups",
		}
	}

	pub fn wedge(self, label: Label) -> Rgb {
		match (self, label) {
			(ColorScheme::Probability, Label::Deficient) => Rgb(0x75, 0xb9, 0xbe),
			(ColorScheme::Probability, Label::Normal) => Rgb(0xfc, 0xde, 0x9c),
			(ColorScheme::Probability, Label::Excess) => Rgb(0xf1, 0x59, 0x46),
			(ColorScheme::Group, Label::Deficient) => Rgb(0xdc, 0xdc, 0xdc),
			(ColorScheme::Group, Label::Normal) => GREY,
			(ColorScheme::Group, Label::Excess) => Rgb(0x45, 0x45, 0x45),
		}
	}

	pub fn node_fill(self, group: Group, is_evidence: bool) -> Rgb {
		if is_evidence {
			return BLACK;
		}
		match self {
			ColorScheme::Probability => WHITE,
			ColorScheme::Group => STAGE_COLORS[group.rank() % STAGE_COLORS.len()],
		}
	}

	/// Glow color for a Markov role, `None` meaning transparent.
	pub fn markov(self, role: MarkovRole) -> Option<Rgb> {
		match (self, role) {
			(_, MarkovRole::Outside) => None,
			(ColorScheme::Probability, MarkovRole::Target) => Some(Rgb(0x0f, 0x5c, 0x28)),
			(ColorScheme::Probability, MarkovRole::Blanket) => Some(Rgb(0x76, 0xd1, 0x3d)),
			(ColorScheme::Group, MarkovRole::Target) => Some(Rgb(0x16, 0x16, 0x94)),
			(ColorScheme::Group, MarkovRole::Blanket) => Some(Rgb(0x90, 0x4f, 0xc2)),
		}
	}

	/// Legend rows, most severe first.
	pub fn legend(self) -> [(Label, Rgb); 3] {
		[Label::Excess, Label::Normal, Label::Deficient].map(|l| (l, self.wedge(l)))
	}
}

impl FromStr for ColorScheme {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		ColorScheme::ALL
			.into_iter()
			.find(|c| c.as_str() == s)
			.ok_or_else(|| format!("unknown color scheme `{s}`"))
	}
}

impl fmt::Display for ColorScheme {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
