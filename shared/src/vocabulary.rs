/*!
Keyword tables used by the classifier, kept as data so they can be tuned from config.

Matching
- Names and material names are split into lowercase tokens on separators, camelCase humps and
  letter/digit boundaries: `"RiverSurface_02"` -> `["river", "surface", "02"]`.
- A keyword matches when some token starts with it, so `"coin"` matches `"Coins"` but
  `"ring"` does not match `"Spring"`.
*/

use serde::{Deserialize, Serialize};

/// Named keyword lists.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Lexicon {
    Water,
    Climb,
    Ground,
    Structural,
    Pickup,
    CoinLike,
    Gate,
    Screen,
    Background,
    Npc,
    Slippery,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub water: Vec<String>,
    pub climb: Vec<String>,
    pub ground: Vec<String>,
    pub structural: Vec<String>,
    pub pickup: Vec<String>,
    pub coin_like: Vec<String>,
    pub gate: Vec<String>,
    pub screen: Vec<String>,
    pub background: Vec<String>,
    pub npc: Vec<String>,
    pub slippery: Vec<String>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            water: words(&["water", "river", "lake", "pond", "sea", "ocean", "stream", "pool"]),
            climb: words(&["ladder", "climb", "vine", "rope", "rung"]),
            ground: words(&[
                "ground", "floor", "platform", "path", "road", "bridge", "terrain", "grass",
                "island", "plaza", "ramp", "stair", "step", "deck", "walkway", "dock", "land",
                "sand",
            ]),
            structural: words(&[
                "wall", "gate", "arch", "tree", "trunk", "npc", "sign", "board", "fence", "pillar",
                "column", "house", "building", "tower", "rock", "cliff", "statue", "door", "post",
                "cane", "ladder",
            ]),
            pickup: words(&[
                "coin", "gem", "box", "ring", "dice", "die", "star", "crystal", "orb", "token",
                "jewel", "diamond", "candy", "pickup", "collectible", "heart",
            ]),
            coin_like: words(&["coin", "token", "ring"]),
            gate: words(&["gate", "arch", "cane", "portal"]),
            screen: words(&["screen", "plasma", "glass", "energy", "membrane", "veil"]),
            background: words(&[
                "sky", "skybox", "skydome", "background", "backdrop", "horizon", "mountain",
                "distant",
            ]),
            npc: words(&["npc", "villager", "merchant", "guide", "keeper"]),
            slippery: words(&["ice", "icy", "slick", "wet", "glass"]),
        }
    }
}

impl Vocabulary {
    pub fn words(&self, lexicon: Lexicon) -> &[String] {
        match lexicon {
            Lexicon::Water => &self.water,
            Lexicon::Climb => &self.climb,
            Lexicon::Ground => &self.ground,
            Lexicon::Structural => &self.structural,
            Lexicon::Pickup => &self.pickup,
            Lexicon::CoinLike => &self.coin_like,
            Lexicon::Gate => &self.gate,
            Lexicon::Screen => &self.screen,
            Lexicon::Background => &self.background,
            Lexicon::Npc => &self.npc,
            Lexicon::Slippery => &self.slippery,
        }
    }

    /// Does any token start with any keyword of `lexicon`?
    pub fn matches(&self, lexicon: Lexicon, tokens: &[String]) -> bool {
        self.words(lexicon).iter().any(|keyword| {
            let keyword = keyword.to_lowercase();
            !keyword.is_empty() && tokens.iter().any(|t| t.starts_with(&keyword))
        })
    }
}

/// Split free text into lowercase tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            continue;
        }

        if let Some(&prev) = i.checked_sub(1).and_then(|p| chars.get(p)) {
            let next = chars.get(i + 1).copied();
            let hump = prev.is_lowercase() && c.is_uppercase();
            let acronym_end = prev.is_uppercase()
                && c.is_uppercase()
                && next.is_some_and(|n| n.is_lowercase());
            let digit_edge = prev.is_alphanumeric()
                && (prev.is_ascii_digit() != c.is_ascii_digit());

            if (hump || acronym_end || digit_edge) && !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        }

        current.extend(c.to_lowercase());
    }

    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Tokens of a mesh name and its material name, in that order.
pub fn tokenize_mesh(name: &str, material: &str) -> Vec<String> {
    let mut tokens = tokenize(name);
    tokens.extend(tokenize(material));
    tokens
}
