//! Bundled farming reference data used to ground chatbot answers.

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CropInfo {
    pub name: &'static str,
    pub regions: &'static [&'static str],
    pub season: &'static str,
    pub soil: &'static str,
    pub notes: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SoilInfo {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub regions: &'static [&'static str],
    pub characteristics: &'static str,
    pub suitable_crops: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct FertilizerInfo {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub composition: &'static str,
    #[serde(rename = "use")]
    pub usage: &'static str,
}

#[derive(Debug, Serialize)]
pub struct KnowledgeBase {
    pub introduction: &'static str,
    pub common_crops: &'static [CropInfo],
    pub soil_types: &'static [SoilInfo],
    pub fertilizers: &'static [FertilizerInfo],
    pub general_advice: &'static str,
}

pub static FARMING_KNOWLEDGE: KnowledgeBase = KnowledgeBase {
    introduction: "General information about farming practices in India: common crops, soil types and fertilizers. Use it when specific real-time data is not available.",
    common_crops: &[
        CropInfo {
            name: "Rice (Paddy)",
            regions: &["West Bengal", "Punjab", "Uttar Pradesh", "Andhra Pradesh", "Tamil Nadu"],
            season: "Kharif (June-October)",
            soil: "Clayey, Loamy soils with good water retention.",
            notes: "Requires significant water. Varieties differ based on region.",
        },
        CropInfo {
            name: "Wheat",
            regions: &["Uttar Pradesh", "Punjab", "Haryana", "Madhya Pradesh", "Rajasthan"],
            season: "Rabi (November-April)",
            soil: "Well-drained loamy and clayey soils.",
            notes: "A staple food crop in North India.",
        },
        CropInfo {
            name: "Millets (Jowar, Bajra, Ragi)",
            regions: &["Rajasthan", "Maharashtra", "Karnataka", "Andhra Pradesh"],
            season: "Kharif",
            soil: "Can grow in less fertile and sandy soils.",
            notes: "Drought-resistant and suitable for arid regions.",
        },
        CropInfo {
            name: "Sugarcane",
            regions: &["Uttar Pradesh", "Maharashtra", "Karnataka", "Tamil Nadu"],
            season: "Annual crop (takes 10-18 months)",
            soil: "Well-drained loamy soils.",
            notes: "Water-intensive cash crop.",
        },
        CropInfo {
            name: "Cotton",
            regions: &["Gujarat", "Maharashtra", "Telangana", "Andhra Pradesh"],
            season: "Kharif",
            soil: "Well-drained deep black soils (regur).",
            notes: "Major cash crop, known as 'white gold'.",
        },
    ],
    soil_types: &[
        SoilInfo {
            kind: "Alluvial Soil",
            regions: &["Indo-Gangetic plains", "coastal plains"],
            characteristics: "Rich in humus, potash, phosphoric acid, and lime. Highly fertile.",
            suitable_crops: &["Rice", "Wheat", "Sugarcane", "Cotton", "Jute"],
        },
        SoilInfo {
            kind: "Black Soil (Regur)",
            regions: &["Deccan plateau (Maharashtra, Madhya Pradesh, Gujarat)"],
            characteristics: "High clay content, retains moisture. Rich in lime, iron, magnesia, and alumina.",
            suitable_crops: &["Cotton", "Sugarcane", "Jowar", "Tobacco", "Wheat"],
        },
        SoilInfo {
            kind: "Red and Yellow Soil",
            regions: &["Eastern and Southern parts of Deccan plateau"],
            characteristics: "Develops on crystalline igneous rocks. Porous, friable structure. Low in nitrogen, phosphorus, and humus.",
            suitable_crops: &["Wheat", "Rice", "Millets", "Pulses"],
        },
        SoilInfo {
            kind: "Laterite Soil",
            regions: &["Karnataka, Kerala, Tamil Nadu, Madhya Pradesh, hilly areas of Odisha and Assam"],
            characteristics: "Rich in iron and aluminum, poor in nitrogen, phosphate, and potash. Acidic.",
            suitable_crops: &["Tea", "Coffee", "Rubber", "Cashew"],
        },
    ],
    fertilizers: &[
        FertilizerInfo {
            name: "Urea",
            kind: "Nitrogenous",
            composition: "46% Nitrogen",
            usage: "Provides nitrogen, essential for leafy growth and green color. Applied during the main growth period.",
        },
        FertilizerInfo {
            name: "Di-Ammonium Phosphate (DAP)",
            kind: "Phosphatic",
            composition: "18% Nitrogen, 46% Phosphorus",
            usage: "Excellent source of phosphorus for root development. Used at the time of sowing.",
        },
        FertilizerInfo {
            name: "Muriate of Potash (MOP)",
            kind: "Potassic",
            composition: "60% Potassium",
            usage: "Improves plant's resistance to diseases and pests, and increases water use efficiency.",
        },
        FertilizerInfo {
            name: "Neem Coated Urea",
            kind: "Slow-release Nitrogenous",
            composition: "Urea coated with neem oil",
            usage: "Slows down the release of nitrogen, reducing nutrient loss and improving nitrogen use efficiency.",
        },
    ],
    general_advice: "Always perform a soil test before applying fertilizers to understand the specific nutrient requirements of your field. Crop rotation is a good practice to maintain soil fertility and reduce pest and disease cycles. Consult with local agricultural extension services for region-specific advice.",
};

impl KnowledgeBase {
    /// The whole base as pretty JSON, for embedding in a prompt.
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Entries whose names or crop lists share a word with `query`.
    ///
    /// Used to point the model at the most relevant part of the base first.
    pub fn highlights(&self, query: &str) -> Vec<&'static str> {
        let words: Vec<String> = query
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() >= 3)
            .map(str::to_lowercase)
            .collect();
        let mentions = |text: &str| {
            let text = text.to_lowercase();
            words.iter().any(|w| text.contains(w.as_str()))
        };

        let crops = self
            .common_crops
            .iter()
            .filter(|c| mentions(c.name))
            .map(|c| c.name);
        let soils = self
            .soil_types
            .iter()
            .filter(|s| mentions(s.kind) || s.suitable_crops.iter().any(|c| mentions(c)))
            .map(|s| s.kind);
        let fertilizers = self
            .fertilizers
            .iter()
            .filter(|f| mentions(f.name) || mentions(f.kind))
            .map(|f| f.name);

        crops.chain(soils).chain(fertilizers).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_json_keeps_original_keys() {
        let json: serde_json::Value =
            serde_json::from_str(&FARMING_KNOWLEDGE.to_prompt_json()).unwrap();
        assert_eq!(json["common_crops"].as_array().unwrap().len(), 5);
        assert_eq!(json["soil_types"][1]["type"], "Black Soil (Regur)");
        assert!(json["fertilizers"][0]["use"].as_str().unwrap().starts_with("Provides"));
    }

    #[test]
    fn highlights_match_crops_soils_and_fertilizers() {
        let hits = FARMING_KNOWLEDGE.highlights("When should I apply urea to my cotton?");
        assert!(hits.contains(&"Cotton"));
        assert!(hits.contains(&"Black Soil (Regur)"));
        assert!(hits.contains(&"Urea"));
        assert!(hits.contains(&"Neem Coated Urea"));
        assert!(FARMING_KNOWLEDGE.highlights("hello").is_empty());
    }
}
