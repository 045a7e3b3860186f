//! Closed catalogs of the choices a user can make for each studio mode.
//!
//! Every option has a stable `id` used for parsing and comparison and a
//! human-readable `label` that is interpolated into instructions.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmoteStyle {
    /// Sentinel: keep the source look and defer styling to the annotation.
    None,
    Cartoon,
    PixelArt,
    Anime,
    Realistic,
    Meme,
}

impl EmoteStyle {
    pub const ALL: [EmoteStyle; 6] = [
        EmoteStyle::None,
        EmoteStyle::Cartoon,
        EmoteStyle::PixelArt,
        EmoteStyle::Anime,
        EmoteStyle::Realistic,
        EmoteStyle::Meme,
    ];

    pub fn id(self) -> &'static str {
        match self {
            EmoteStyle::None => "none",
            EmoteStyle::Cartoon => "cartoon",
            EmoteStyle::PixelArt => "pixel_art",
            EmoteStyle::Anime => "anime",
            EmoteStyle::Realistic => "realistic",
            EmoteStyle::Meme => "meme",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EmoteStyle::None => "None / Custom",
            EmoteStyle::Cartoon => "Vector Cartoon",
            EmoteStyle::PixelArt => "Pixel Art",
            EmoteStyle::Anime => "Chibi Anime",
            EmoteStyle::Realistic => "Semi-Realistic 3D",
            EmoteStyle::Meme => "Meme Style",
        }
    }

    pub fn is_custom(self) -> bool {
        self == EmoteStyle::None
    }

    pub fn from_id(value: &str) -> Option<Self> {
        find_by_id(&Self::ALL, value, |style| style.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmoteEmotion {
    Hype,
    Angry,
    Sad,
    Laughing,
    Cool,
    Love,
    Shocked,
}

impl EmoteEmotion {
    pub const ALL: [EmoteEmotion; 7] = [
        EmoteEmotion::Hype,
        EmoteEmotion::Angry,
        EmoteEmotion::Sad,
        EmoteEmotion::Laughing,
        EmoteEmotion::Cool,
        EmoteEmotion::Love,
        EmoteEmotion::Shocked,
    ];

    pub fn id(self) -> &'static str {
        match self {
            EmoteEmotion::Hype => "hype",
            EmoteEmotion::Angry => "angry",
            EmoteEmotion::Sad => "sad",
            EmoteEmotion::Laughing => "laughing",
            EmoteEmotion::Cool => "cool",
            EmoteEmotion::Love => "love",
            EmoteEmotion::Shocked => "shocked",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EmoteEmotion::Hype => "Hype / Excited",
            EmoteEmotion::Angry => "Angry / Rage",
            EmoteEmotion::Sad => "Sad / Cry",
            EmoteEmotion::Laughing => "Laughing / LUL",
            EmoteEmotion::Cool => "Cool / Sunglasses",
            EmoteEmotion::Love => "Love / Hearts",
            EmoteEmotion::Shocked => "Shocked / Pog",
        }
    }

    pub fn from_id(value: &str) -> Option<Self> {
        find_by_id(&Self::ALL, value, |emotion| emotion.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortraitStyle {
    /// Sentinel: no preset filter, the annotation drives the look.
    None,
    Disney3d,
    Anime,
    Gta,
    Simpsons,
    Ghibli,
    Chibi,
    Manga,
    Comic,
    PixelArt,
    Vector,
    FlatDesign,
    Childlike,
    Fantasy,
    ConceptArt,
    Cyberpunk,
    Sketch,
    OilPainting,
}

impl PortraitStyle {
    pub const ALL: [PortraitStyle; 18] = [
        PortraitStyle::None,
        PortraitStyle::Disney3d,
        PortraitStyle::Anime,
        PortraitStyle::Gta,
        PortraitStyle::Simpsons,
        PortraitStyle::Ghibli,
        PortraitStyle::Chibi,
        PortraitStyle::Manga,
        PortraitStyle::Comic,
        PortraitStyle::PixelArt,
        PortraitStyle::Vector,
        PortraitStyle::FlatDesign,
        PortraitStyle::Childlike,
        PortraitStyle::Fantasy,
        PortraitStyle::ConceptArt,
        PortraitStyle::Cyberpunk,
        PortraitStyle::Sketch,
        PortraitStyle::OilPainting,
    ];

    pub fn id(self) -> &'static str {
        match self {
            PortraitStyle::None => "none",
            PortraitStyle::Disney3d => "disney_3d",
            PortraitStyle::Anime => "anime",
            PortraitStyle::Gta => "gta",
            PortraitStyle::Simpsons => "simpsons",
            PortraitStyle::Ghibli => "ghibli",
            PortraitStyle::Chibi => "chibi",
            PortraitStyle::Manga => "manga",
            PortraitStyle::Comic => "comic",
            PortraitStyle::PixelArt => "pixel_art",
            PortraitStyle::Vector => "vector",
            PortraitStyle::FlatDesign => "flat_design",
            PortraitStyle::Childlike => "childlike",
            PortraitStyle::Fantasy => "fantasy",
            PortraitStyle::ConceptArt => "concept_art",
            PortraitStyle::Cyberpunk => "cyberpunk",
            PortraitStyle::Sketch => "sketch",
            PortraitStyle::OilPainting => "oil_painting",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PortraitStyle::None => "None / Custom",
            PortraitStyle::Disney3d => "Disney/Pixar 3D",
            PortraitStyle::Anime => "Epic Japanese Anime",
            PortraitStyle::Gta => "GTA (Grand Theft Auto)",
            PortraitStyle::Simpsons => "Yellow Cartoon (Simpsons)",
            PortraitStyle::Ghibli => "Studio Ghibli",
            PortraitStyle::Chibi => "Chibi / Kawaii",
            PortraitStyle::Manga => "Black and White Manga",
            PortraitStyle::Comic => "Vintage American Comic",
            PortraitStyle::PixelArt => "Retro Pixel Art",
            PortraitStyle::Vector => "Flat Vector Art",
            PortraitStyle::FlatDesign => "Minimalist Flat Design",
            PortraitStyle::Childlike => "Children's Storybook / Crayon",
            PortraitStyle::Fantasy => "Epic RPG Fantasy",
            PortraitStyle::ConceptArt => "Video Game Concept Art",
            PortraitStyle::Cyberpunk => "Futuristic Cyberpunk",
            PortraitStyle::Sketch => "Artistic Pencil Sketch",
            PortraitStyle::OilPainting => "Classic Oil Painting",
        }
    }

    pub fn from_id(value: &str) -> Option<Self> {
        find_by_id(&Self::ALL, value, |style| style.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackgroundOption {
    Transparent,
    White,
    Black,
    Green,
    Cyberpunk,
    Studio,
    Nature,
}

impl BackgroundOption {
    pub const ALL: [BackgroundOption; 7] = [
        BackgroundOption::Transparent,
        BackgroundOption::White,
        BackgroundOption::Black,
        BackgroundOption::Green,
        BackgroundOption::Cyberpunk,
        BackgroundOption::Studio,
        BackgroundOption::Nature,
    ];

    pub fn id(self) -> &'static str {
        match self {
            BackgroundOption::Transparent => "transparent",
            BackgroundOption::White => "white",
            BackgroundOption::Black => "black",
            BackgroundOption::Green => "green",
            BackgroundOption::Cyberpunk => "cyberpunk",
            BackgroundOption::Studio => "studio",
            BackgroundOption::Nature => "nature",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BackgroundOption::Transparent => "Transparent Background (AI attempt)",
            BackgroundOption::White => "White Background (Product)",
            BackgroundOption::Black => "Black Background (Dark Mode)",
            BackgroundOption::Green => "Green Screen (Chroma Key)",
            BackgroundOption::Cyberpunk => "Neon/Cyberpunk Background",
            BackgroundOption::Studio => "Photo Studio Background",
            BackgroundOption::Nature => "Nature/Forest Background",
        }
    }

    pub fn from_id(value: &str) -> Option<Self> {
        find_by_id(&Self::ALL, value, |option| option.id())
    }
}

fn find_by_id<T: Copy>(all: &[T], value: &str, id: impl Fn(T) -> &'static str) -> Option<T> {
    let wanted = value.trim().to_ascii_lowercase().replace(&['-', ' '][..], "_");
    all.iter().copied().find(|entry| id(*entry) == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique_within_each_catalog() {
        let emote: HashSet<_> = EmoteStyle::ALL.iter().map(|s| s.id()).collect();
        assert_eq!(emote.len(), EmoteStyle::ALL.len());
        let emotions: HashSet<_> = EmoteEmotion::ALL.iter().map(|e| e.id()).collect();
        assert_eq!(emotions.len(), EmoteEmotion::ALL.len());
        let portrait: HashSet<_> = PortraitStyle::ALL.iter().map(|s| s.id()).collect();
        assert_eq!(portrait.len(), PortraitStyle::ALL.len());
        let backgrounds: HashSet<_> = BackgroundOption::ALL.iter().map(|b| b.id()).collect();
        assert_eq!(backgrounds.len(), BackgroundOption::ALL.len());
    }

    #[test]
    fn parses_ids_leniently() {
        assert_eq!(EmoteStyle::from_id("Pixel-Art"), Some(EmoteStyle::PixelArt));
        assert_eq!(PortraitStyle::from_id(" disney 3d "), Some(PortraitStyle::Disney3d));
        assert_eq!(BackgroundOption::from_id("GREEN"), Some(BackgroundOption::Green));
        assert_eq!(EmoteEmotion::from_id("pog"), None);
    }

    #[test]
    fn only_the_sentinel_is_custom() {
        let custom: Vec<_> = EmoteStyle::ALL.iter().filter(|s| s.is_custom()).collect();
        assert_eq!(custom, vec![&EmoteStyle::None]);
    }
}
