//! Label normalization.
//!
//! Detectors and users spell the same class several ways ("phone",
//! "Cell_Phone", "mobile"). Every label is trimmed, lower-cased and then
//! collapsed onto a canonical COCO name through a fixed synonym table before
//! it is compared against an allow-set.

/// Canonical labels keyed by their accepted aliases (already lower-cased).
pub const SYNONYMS: &[(&str, &str)] = &[
    ("phone", "cell phone"),
    ("cellphone", "cell phone"),
    ("cell_phone", "cell phone"),
    ("mobile", "cell phone"),
    ("mobile phone", "cell phone"),
    ("face", "face"),
    ("faces", "face"),
    ("person", "person"),
    ("people", "person"),
    ("human", "person"),
];

/// Normalize a raw label: trim, lower-case, then map known aliases.
///
/// Unmapped labels pass through in their trimmed, lower-cased form.
pub fn normalize(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    canonical(&lowered)
        .map(str::to_string)
        .unwrap_or(lowered)
}

fn canonical(lowered: &str) -> Option<&'static str> {
    SYNONYMS
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map(|(_, canonical)| *canonical)
}

/// Help text for `--list-common-labels`.
pub const COMMON_LABELS_HELP: &str = "\
Common YOLO detection labels:
   Objects: person, car, truck, bus, bicycle, motorcycle
   Electronics: cell phone, laptop, tv, mouse, keyboard
   Animals: dog, cat, bird, horse, cow, sheep
   Food: banana, apple, sandwich, pizza, cake
   Sports: frisbee, sports ball, tennis racket
   Furniture: chair, couch, bed, dining table

Examples:
   # specific objects with high confidence
   detection_filter --labels 'cell phone' --min-confidence 0.7

   # several objects with a confidence floor
   detection_filter --labels person car --min-confidence 0.5

   # faces only
   detection_filter --labels face --min-confidence 0.8

Performance notes:
   Higher --min-confidence means fewer detections to process.
   Fewer --labels means more filtering.
   Aliases such as phone, mobile, people and faces are accepted.";
