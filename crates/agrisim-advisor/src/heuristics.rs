//! Deterministic advisory heuristics.
//!
//! Every report field has a rule-based fallback computed from the crop
//! snapshot alone. A report built entirely from these rules is what the
//! caller gets whenever the external service is disabled, unreachable,
//! slow or incoherent, and individual rules backfill any section a service
//! reply did not cover.

use agrisim_types::{AdvisoryReport, ConditionBand, ReportSource};
use chrono::Utc;

use crate::subject::AdvisorySubject;

/// Confidence of a report built entirely from heuristics.
pub const FALLBACK_CONFIDENCE: u8 = 85;

/// Confidence ceiling of a report parsed from a live service reply.
pub const CONNECTED_CONFIDENCE: u8 = 95;

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// Composite of health, water, nutrients and inverted disease, 0--100.
pub fn composite_score(subject: &AdvisorySubject) -> f64 {
    (subject.health + subject.water_level + subject.nutrient_level + (100.0 - subject.disease_level))
        / 4.0
}

/// Condition band and its description.
pub fn assess_condition(subject: &AdvisorySubject) -> (ConditionBand, &'static str) {
    let band = ConditionBand::from_score(composite_score(subject));
    let text = match band {
        ConditionBand::Excellent => {
            "Excellent condition - plant is thriving with optimal care and environmental conditions"
        }
        ConditionBand::Good => {
            "Good condition - plant is healthy with minor optimization opportunities available"
        }
        ConditionBand::Fair => {
            "Fair condition - requires attention to improve overall health and productivity"
        }
        ConditionBand::Poor => {
            "Poor condition - immediate intervention required to prevent further deterioration"
        }
        ConditionBand::Critical => {
            "Critical condition - plant survival at risk without urgent comprehensive care"
        }
    };
    (band, text)
}

// ---------------------------------------------------------------------------
// Urgent action
// ---------------------------------------------------------------------------

/// The single most pressing action, by descending priority.
pub fn urgent_action(subject: &AdvisorySubject) -> &'static str {
    if subject.health < 30.0 {
        "Apply immediate comprehensive treatment - plant health critically low, risk of plant death"
    } else if subject.water_level < 20.0 {
        "Water immediately with deep irrigation - severe dehydration detected, cellular damage possible"
    } else if subject.disease_level > 70.0 {
        "Apply targeted fungicide/pesticide treatment - severe disease outbreak threatening plant survival"
    } else if subject.growth >= 80.0 {
        // Health is at least 30 here.
        "Ready for harvest - optimal timing achieved for maximum yield and quality"
    } else if subject.water_level < 40.0 {
        "Increase watering frequency and depth - moderate dehydration affecting growth rate"
    } else if subject.nutrient_level < 30.0 {
        "Apply balanced fertilizer immediately - severe nutrient deficiency limiting growth potential"
    } else {
        "Continue current care routine with minor adjustments - plant progressing within normal parameters"
    }
}

// ---------------------------------------------------------------------------
// Recommendations and disease advice
// ---------------------------------------------------------------------------

/// Care suggestions for every deficient dimension, joined into one text.
pub fn recommendations(subject: &AdvisorySubject) -> String {
    let mut items: Vec<&str> = Vec::with_capacity(5);
    if subject.soil_moisture < 40.0 {
        items.push("Improve soil water retention with organic mulch layer (2-3 inches)");
    }
    if subject.nutrient_level < 50.0 {
        items.push("Apply slow-release fertilizer for sustained nutrition over 6-8 weeks");
    }
    if subject.disease_level > 30.0 {
        items.push("Improve air circulation and reduce humidity around plant base");
    }
    if subject.growth < 50.0 {
        items.push("Ensure 6-8 hours direct sunlight exposure for optimal photosynthesis");
    }
    if subject.environmental_stress > 0.6 {
        items.push("Provide environmental protection during extreme weather conditions");
    }
    if items.is_empty() {
        return "Maintain current care practices with regular monitoring".to_owned();
    }
    items.join(". ")
}

/// Disease and pest management advice.
pub fn disease_advice(subject: &AdvisorySubject) -> &'static str {
    if subject.disease_level > 50.0 {
        "High disease pressure detected. Apply organic neem oil or copper-based fungicide every 7-10 days. Improve drainage and air circulation. Remove affected plant material immediately."
    } else if subject.disease_level > 25.0 {
        "Moderate disease risk present. Monitor closely for symptoms and consider preventive treatments. Remove affected leaves if visible. Ensure proper plant spacing."
    } else {
        "Low disease risk maintained. Continue preventive care with proper spacing, watering practices, and regular inspection for early detection."
    }
}

// ---------------------------------------------------------------------------
// Yield and timeline
// ---------------------------------------------------------------------------

/// Expected quality fraction, 0--1: vitals blended with the stress penalty.
pub fn yield_quality(subject: &AdvisorySubject) -> f64 {
    let vitals = (subject.health + subject.nutrient_level + (100.0 - subject.disease_level)) / 300.0;
    let environmental = 1.0 - subject.environmental_stress * 0.3;
    (vitals * environmental).clamp(0.0, 1.0)
}

/// Expected yield text.
pub fn predict_yield(subject: &AdvisorySubject) -> String {
    let quality = yield_quality(subject);
    let rating = if quality > 0.8 {
        "Premium"
    } else if quality > 0.6 {
        "Good"
    } else if quality > 0.4 {
        "Fair"
    } else {
        "Poor"
    };
    format!(
        "Expected yield: {} at {rating} quality ({}% of optimal potential)",
        subject.yield_descriptor,
        whole_percent(quality * 100.0),
    )
}

/// Expected time to harvest.
pub fn timeline(subject: &AdvisorySubject) -> String {
    let days = subject.days_to_maturity;
    if subject.growth >= 80.0 {
        "Harvest within 1-3 days for optimal quality and maximum yield potential".to_owned()
    } else if days <= 7 {
        format!("Approaching maturity in {days} days. Prepare harvest equipment and storage.")
    } else if days <= 14 {
        format!("{days} days to maturity. Focus on consistent care and monitoring.")
    } else {
        format!("{days} days to maturity. Establish strong growth foundation with optimal nutrition.")
    }
}

// ---------------------------------------------------------------------------
// Confidence and assembly
// ---------------------------------------------------------------------------

/// Fraction of the core vitals that carry usable data, 0--1.
pub fn data_completeness(subject: &AdvisorySubject) -> f64 {
    let present = [
        subject.health > 0.0,
        subject.water_level >= 0.0,
        subject.nutrient_level >= 0.0,
        subject.growth >= 0.0,
    ];
    let count = present.iter().filter(|p| **p).count();
    // At most four.
    #[allow(clippy::cast_precision_loss)]
    let fraction = count as f64 / 4.0;
    fraction
}

/// Confidence of a service-backed report.
pub fn confidence(subject: &AdvisorySubject, connected: bool) -> u8 {
    let ceiling = if connected {
        CONNECTED_CONFIDENCE
    } else {
        FALLBACK_CONFIDENCE
    };
    let value = (data_completeness(subject) * f64::from(ceiling)).floor();
    // Bounded by the ceiling, which fits in u8.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let confidence = value.clamp(0.0, 100.0) as u8;
    confidence
}

/// A complete report built from the heuristics alone.
pub fn fallback_report(subject: &AdvisorySubject) -> AdvisoryReport {
    let (condition_band, condition) = assess_condition(subject);
    AdvisoryReport {
        condition: condition.to_owned(),
        condition_band,
        urgent_action: urgent_action(subject).to_owned(),
        recommendations: recommendations(subject),
        disease_management: disease_advice(subject).to_owned(),
        yield_prediction: predict_yield(subject),
        timeline: timeline(subject),
        confidence: FALLBACK_CONFIDENCE,
        source: ReportSource::Fallback,
        generated_at: Utc::now(),
    }
}

fn whole_percent(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let whole = value.floor().min(100.0) as u32;
    whole
}
