//! Static curriculum reference data
//!
//! The topics and difficulty levels a student can choose from. Labels and
//! example questions are shown to students as-is, so they stay in French to
//! match the Secondaire 3 audience.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A mathematics subject area selectable by the student
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topic {
    ExponentsAndScientificNotation,
    Equations,
    Functions,
    Geometry,
}

impl Topic {
    /// Every topic, in display order
    pub const ALL: [Topic; 4] = [
        Topic::ExponentsAndScientificNotation,
        Topic::Equations,
        Topic::Functions,
        Topic::Geometry,
    ];

    /// Stable identifier used on the wire
    pub fn slug(self) -> &'static str {
        match self {
            Topic::ExponentsAndScientificNotation => "exponents-and-scientific-notation",
            Topic::Equations => "equations",
            Topic::Functions => "functions",
            Topic::Geometry => "geometry",
        }
    }

    /// Display label, also embedded in the system prompt
    pub fn label(self) -> &'static str {
        match self {
            Topic::ExponentsAndScientificNotation => "Exposants et notation scientifique",
            Topic::Equations => "Équations",
            Topic::Functions => "Fonctions",
            Topic::Geometry => "Géométrie",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Topic::ExponentsAndScientificNotation => "🔢",
            Topic::Equations => "⚖️",
            Topic::Functions => "📈",
            Topic::Geometry => "📐",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Topic::ExponentsAndScientificNotation => {
                "Puissances, exposants négatifs, notation scientifique"
            }
            Topic::Equations => "Équations du 1er et 2e degré, systèmes d'équations",
            Topic::Functions => "Fonctions linéaires, affines, règles de transformation",
            Topic::Geometry => "Théorème de Pythagore, aires, volumes, triangles semblables",
        }
    }

    /// Example questions for the inspiration panel
    pub fn example_questions(self) -> &'static [&'static str] {
        match self {
            Topic::ExponentsAndScientificNotation => &[
                "Comment je calcule 2^5 × 2^3 ?",
                "Comment j'écris 0.000045 en notation scientifique ?",
                "Qu'est-ce qu'un exposant négatif ?",
                "Comment je simplifie (3^4)^2 ?",
            ],
            Topic::Equations => &[
                "Comment je résous 3x - 7 = 14 ?",
                "Comment je résous une équation du 2e degré ?",
                "C'est quoi un système d'équations ?",
                "Comment je vérifie ma réponse ?",
            ],
            Topic::Functions => &[
                "C'est quoi une fonction affine ?",
                "Comment je trouve la pente d'une droite ?",
                "Comment je trace le graphique de y = 2x + 3 ?",
                "Comment les transformations affectent les fonctions ?",
            ],
            Topic::Geometry => &[
                "Comment j'utilise le théorème de Pythagore ?",
                "Comment je calcule l'aire d'un triangle ?",
                "C'est quoi des triangles semblables ?",
                "Comment je trouve le volume d'un cylindre ?",
            ],
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// How demanding the tutor's explanations should be
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Display label, also embedded in the system prompt
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Facile",
            Difficulty::Medium => "Moyen",
            Difficulty::Hard => "Difficile",
        }
    }
}

/// Serializable view of a topic for the topic picker
#[derive(Debug, Clone, Serialize)]
pub struct TopicInfo {
    pub id: Topic,
    pub label: &'static str,
    pub emoji: &'static str,
    pub description: &'static str,
    pub examples: &'static [&'static str],
}

impl From<Topic> for TopicInfo {
    fn from(topic: Topic) -> Self {
        Self {
            id: topic,
            label: topic.label(),
            emoji: topic.emoji(),
            description: topic.description(),
            examples: topic.example_questions(),
        }
    }
}

/// The full topic catalogue in display order
pub fn catalogue() -> Vec<TopicInfo> {
    Topic::ALL.into_iter().map(TopicInfo::from).collect()
}
