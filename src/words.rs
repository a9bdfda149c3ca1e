use rand::seq::IndexedRandom;
use std::collections::HashSet;

const WORDS: &[&str] = &[
    // Animals
    "cat", "dog", "elephant", "giraffe", "lion", "tiger", "bear", "rabbit", "snake", "bird",
    "fish", "whale", "dolphin", "shark", "penguin", "monkey", "horse", "cow", "pig", "chicken",
    "duck", "frog", "turtle", "butterfly", "spider", "ant", "bee", "eagle", "owl", "wolf",
    // Objects
    "chair", "table", "lamp", "book", "phone", "computer", "television", "clock", "mirror", "door",
    "window", "bed", "pillow", "blanket", "cup", "plate", "fork", "knife", "spoon", "bottle",
    "key", "umbrella", "camera", "guitar", "piano", "drum", "bicycle", "car", "airplane", "train",
    // Food
    "apple", "banana", "orange", "pizza", "burger", "hotdog", "cake", "cookie", "icecream", "bread",
    "cheese", "egg", "bacon", "sandwich", "salad", "soup", "pasta", "rice", "chicken", "steak",
    // Nature
    "tree", "flower", "mountain", "river", "ocean", "beach", "sun", "moon", "star", "cloud",
    "rain", "snow", "rainbow", "forest", "desert", "island", "volcano", "waterfall", "grass", "leaf",
    // Activities
    "running", "swimming", "dancing", "singing", "cooking", "reading", "writing", "painting", "sleeping", "eating",
    "jumping", "climbing", "flying", "fishing", "camping", "hiking", "skiing", "surfing", "boxing", "wrestling",
    // Places
    "house", "school", "hospital", "airport", "beach", "park", "zoo", "museum", "library", "restaurant",
    "hotel", "church", "castle", "bridge", "tower", "stadium", "cinema", "mall", "bank", "farm",
    // Body parts
    "eye", "ear", "nose", "mouth", "hand", "foot", "arm", "leg", "head", "hair",
    "finger", "toe", "knee", "elbow", "shoulder", "neck", "back", "stomach", "heart", "brain",
    // Clothing
    "shirt", "pants", "dress", "shoes", "hat", "socks", "jacket", "coat", "gloves", "scarf",
    "tie", "belt", "glasses", "watch", "ring", "necklace", "earring", "bracelet", "boots", "sandals",
    // Professions
    "doctor", "teacher", "police", "firefighter", "chef", "pilot", "astronaut", "artist", "singer", "actor",
    "nurse", "dentist", "lawyer", "engineer", "farmer", "soldier", "sailor", "clown", "magician", "ninja",
    // Miscellaneous
    "robot", "ghost", "alien", "dragon", "unicorn", "wizard", "princess", "knight", "pirate", "zombie",
    "treasure", "crown", "sword", "shield", "arrow", "bomb", "rocket", "satellite", "telescope", "microscope",
];

/// Pool of candidate words offered to drawers
#[derive(Debug, Clone)]
pub struct WordBank {
    words: Vec<String>,
}

impl Default for WordBank {
    fn default() -> Self {
        Self::new()
    }
}

impl WordBank {
    /// Builds the bank from the built-in word list
    pub fn new() -> Self {
        Self::from_words(WORDS.iter().copied())
    }

    /// Builds a bank from an arbitrary list. Words are lower-cased and
    /// duplicates dropped so a draw never offers the same word twice.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty() && seen.insert(w.clone()))
            .collect();

        Self { words }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Returns up to `count` distinct words in random order
    pub fn random_words(&self, count: usize) -> Vec<String> {
        self.words
            .choose_multiple(&mut rand::rng(), count)
            .cloned()
            .collect()
    }
}
