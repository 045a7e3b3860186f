use super::options::{BackgroundOption, EmoteEmotion, EmoteStyle, PortraitStyle};

pub const PRESERVE_MEDIUM_INSTRUCTION: &str = "KEEP THE EXACT VISUAL STYLE OF THE ORIGINAL IMAGE. If it is a photograph, it must still look like a photograph. If it is a drawing, keep that drawing style. Do NOT apply 'cartoon' or 'vector' filters unless the extra instructions ask for them.";

pub const FLAT_STICKER_REQUIREMENT: &str =
    "Simplify details, use thick outlines and flat colors (sticker/vector look).";

pub const DEFAULT_PORTRAIT_STYLE_INSTRUCTION: &str =
    "Make sure the art style is very evident, stylized and high quality.";

pub const DEFAULT_BACKGROUND_DESCRIPTION: &str =
    "Clean, solid background that makes the subject stand out.";

static PORTRAIT_STYLE_INSTRUCTIONS: &[(PortraitStyle, &str)] = &[
    (
        PortraitStyle::None,
        "Do not apply a predefined style filter. Strictly follow the user's additional instructions to define the visual style. If the user does not specify a style in the text, improve the quality of the original image while keeping it realistic or faithful to its source, with a high-end artistic finish.",
    ),
    (
        PortraitStyle::Gta,
        "Use the Grand Theft Auto loading-screen art style. Hard shading, saturated colors, bold black outlines, a cool and dangerous vibe.",
    ),
    (
        PortraitStyle::Disney3d,
        "Modern 3D animated film style (Pixar/Disney). Soft textures, cinematic lighting, big expressive eyes, adorable.",
    ),
    (
        PortraitStyle::Simpsons,
        "The Simpsons cartoon style. Yellow skin, big round eyes, simple outlines, Matt Groening style.",
    ),
    (
        PortraitStyle::Anime,
        "High-quality Japanese anime style. Detailed eyes, stylized hair, dramatic lighting effects, modern Shonen or Shojo look.",
    ),
    (
        PortraitStyle::Ghibli,
        "Studio Ghibli style (Hayao Miyazaki). Vibrant yet natural colors, detailed hand-painted backgrounds, characters with soft expressive features, a magical and nostalgic atmosphere.",
    ),
    (
        PortraitStyle::Chibi,
        "Chibi/Kawaii style. Big heads (super deformed), small bodies, huge shiny eyes, blushing cheeks, extremely cute and simplified.",
    ),
    (
        PortraitStyle::Manga,
        "Traditional Japanese manga style. Black and white, screentones, dynamic inking, high contrast, printed comic look.",
    ),
    (
        PortraitStyle::PixelArt,
        "High-quality pixel art. Retro 16-bit video game style, limited color palette, dithered shading.",
    ),
    (
        PortraitStyle::Vector,
        "Clean vector art. Crisp lines, well-defined geometric shapes, vibrant solid colors, no complex gradients, Adobe Illustrator look.",
    ),
    (
        PortraitStyle::FlatDesign,
        "Modern flat design. Minimalist, two-dimensional, bright solid colors, simplified shapes, no textures or complex shadows, corporate tech style.",
    ),
    (
        PortraitStyle::Childlike,
        "Children's storybook illustration. Crayon drawing, soft watercolor or colored pencil, innocent strokes, pastel colors, dreamy and whimsical.",
    ),
    (
        PortraitStyle::Fantasy,
        "Epic fantasy art. Dungeons & Dragons or Magic: The Gathering style. Magical lighting, detailed armor, ethereal and heroic atmosphere.",
    ),
    (
        PortraitStyle::ConceptArt,
        "Concept art for AAA video games. Visible but detailed digital brush strokes (digital painting), dramatic lighting, strong character design, atmospheric background.",
    ),
];

static BACKGROUND_DESCRIPTIONS: &[(&str, &str)] = &[
    (
        "transparent",
        "FULLY TRANSPARENT background, or Pure White if you cannot generate alpha. Prioritize isolating the subject perfectly.",
    ),
    (
        "white",
        "PURE WHITE background (Hex #FFFFFF). Product or ID photo style.",
    ),
    (
        "black",
        "PURE BLACK background (Hex #000000). Elegant or dark mode style.",
    ),
    (
        "green",
        "CHROMA KEY GREEN background (Hex #00FF00). Flat bright green to make video editing easy.",
    ),
    (
        "cyberpunk",
        "Futuristic Cyberpunk urban background. Neon lights, rainy night, bokeh blur.",
    ),
    (
        "studio",
        "Professional photo studio background. Neutral gray with soft three-point lighting.",
    ),
    (
        "nature",
        "Natural forest or landscape background, softly blurred to make the subject stand out.",
    ),
];

pub fn portrait_style_instruction(style: PortraitStyle) -> &'static str {
    PORTRAIT_STYLE_INSTRUCTIONS
        .iter()
        .find(|(entry, _)| *entry == style)
        .map(|(_, instruction)| *instruction)
        .unwrap_or(DEFAULT_PORTRAIT_STYLE_INSTRUCTION)
}

/// Looks up the background description by option id, falling back to a
/// generic solid background for ids outside the catalog.
pub fn background_description_for_id(id: &str) -> &'static str {
    BACKGROUND_DESCRIPTIONS
        .iter()
        .find(|(entry, _)| *entry == id)
        .map(|(_, description)| *description)
        .unwrap_or(DEFAULT_BACKGROUND_DESCRIPTION)
}

pub fn background_description(option: BackgroundOption) -> &'static str {
    background_description_for_id(option.id())
}

pub fn build_emote_prompt(style: EmoteStyle, emotion: EmoteEmotion, annotation: &str) -> String {
    let emotion = emotion.label();
    let style_instruction = if style.is_custom() {
        PRESERVE_MEDIUM_INSTRUCTION.to_string()
    } else {
        format!("Strongly apply the art style: {}", style.label())
    };

    let technical_requirements = if style.is_custom() {
        [
            "1. Crop: Zoom aggressively on the face or main subject to maximize space on the square canvas.".to_string(),
            "2. Background: Remove the original background and replace it with transparency, or a vibrant solid color only if it improves visibility.".to_string(),
            format!("3. Expression: Modify the face to reflect the emotion '{emotion}' naturally (photobashing style), without breaking the realism or original style of the image."),
            "4. Legibility: Increase contrast and brightness so it reads well at small size (28px).".to_string(),
        ]
    } else {
        [
            format!("1. Visual style: {FLAT_STICKER_REQUIREMENT}"),
            "2. Background: Solid or transparent, clean.".to_string(),
            "3. Composition: Big head, small or no body. Maximum zoom on the expression.".to_string(),
            format!("4. Expression: Exaggerated and caricatured for the emotion '{emotion}'."),
        ]
    };

    let mut prompt = String::new();
    prompt.push_str("Act as an expert Twitch graphic designer.\n");
    prompt.push_str("Transform the attached reference image into a professional Twitch emote.\n\n");
    prompt.push_str("Order details:\n");
    prompt.push_str(&format!("- Style instruction: {style_instruction}\n"));
    prompt.push_str(&format!("- Requested emotion: {emotion}\n"));
    prompt.push_str(&format!("- Extra user instructions: {annotation}\n\n"));
    prompt.push_str("CRITICAL technical requirements:\n");
    for requirement in technical_requirements {
        prompt.push_str(&requirement);
        prompt.push('\n');
    }
    prompt.push_str("5. Do not include small text.\n\n");
    prompt.push_str("Generate only the final emote image.");
    prompt
}

pub fn build_portrait_prompt(style: PortraitStyle, annotation: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str("Act as a world-class professional digital artist.\n");
    prompt.push_str(
        "Your task is to transform the provided photo into a high-quality artistic illustration (\"your drawn version\").\n\n",
    );
    prompt.push_str(&format!("Requested style: {}\n", style.label()));
    prompt.push_str(&format!("Additional instructions: {annotation}\n\n"));
    prompt.push_str("Specific style instructions:\n");
    prompt.push_str(portrait_style_instruction(style));
    prompt.push_str("\n\n");
    prompt.push_str("General requirements:\n");
    prompt.push_str("1. Keep the key facial features and identity of the person, but fully adapt them to the chosen art style (if one was chosen).\n");
    prompt.push_str("2. The composition must be aesthetically pleasing and suitable for a profile picture or avatar.\n");
    prompt.push_str("3. Professional, high-quality lighting and colors.\n");
    // Emitted for every style, not only the matching one.
    prompt.push_str("4. If the style is GTA, use the classic cel-shading and defined edges.\n");
    prompt.push_str("5. If the style is Disney/Pixar, use soft 3D rendering, expressive eyes and warm lighting.\n\n");
    prompt.push_str("Generate only the illustration.");
    prompt
}

pub fn build_background_prompt(background: BackgroundOption, annotation: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str("Act as an expert photo editor with AI tools.\n");
    prompt.push_str("Your task is to ISOLATE THE MAIN SUBJECT (person, pet or object) of the image and place it on a new background.\n\n");
    prompt.push_str(&format!(
        "Background setting: {}\n",
        background_description(background)
    ));
    prompt.push_str(&format!("Additional instructions: {annotation}\n\n"));
    prompt.push_str("STRICT RULES:\n");
    prompt.push_str("1. IDENTITY: The main subject must look IDENTICAL to the original. Do NOT caricature it or change its art style. Keep photorealism if it is a photo.\n");
    prompt.push_str("2. CUTOUT: The subject's edges must be clean and precise.\n");
    prompt.push_str("3. LIGHTING: Subtly adjust the subject's lighting so it fits the requested background better, without losing its essence.\n");
    prompt.push_str("4. If Transparent/Green/White is requested: the goal is utility (sticker/png).\n");
    prompt.push_str("5. If an artistic background is requested (Cyberpunk, Nature): integrate the subject realistically into the environment.\n\n");
    prompt.push_str("Generate the image with the subject isolated on the requested background.");
    prompt
}
