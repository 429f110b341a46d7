//! Keyword templates
//!
//! Each template is a pure function from a service phrase plus context to a
//! list of keyword strings. [`TEMPLATES`] lists them in generation order.

use crate::taxonomy::KeywordCategory;

pub const QUALITY_INDICATORS: &[&str] = &["best", "professional", "trusted", "expert"];
pub const BUSINESS_TYPE_INDICATORS: &[&str] = &["company", "specialists", "services"];
pub const PRICE_WORDS: &[&str] = &["cost", "prices", "quote"];
pub const ACTION_VERBS: &[&str] = &["hire", "book", "find"];
pub const URGENCY_WORDS: &[&str] = &["emergency", "urgent", "same day", "24 hour"];
pub const PROXIMITY_PHRASES: &[&str] = &["near me", "nearby"];
pub const QUESTION_PHRASES: &[&str] = &["what is", "how to choose"];

/// Inputs shared by all templates for one generation run
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    pub business_name: String,
    /// Lowercased location names
    pub locations: Vec<String>,
    pub target_market: Vec<String>,
}

pub type RenderFn = fn(&str, &TemplateContext) -> Vec<String>;

pub struct KeywordTemplate {
    pub name: &'static str,
    pub category: KeywordCategory,
    /// Relevance weight attached to every keyword this template produces
    pub relevance: f64,
    pub render: RenderFn,
}

impl KeywordTemplate {
    pub fn render(&self, service: &str, context: &TemplateContext) -> Vec<String> {
        (self.render)(service, context)
    }
}

pub static TEMPLATES: &[KeywordTemplate] = &[
    KeywordTemplate {
        name: "business_type",
        category: KeywordCategory::Primary,
        relevance: 0.7,
        render: business_type,
    },
    KeywordTemplate {
        name: "quality",
        category: KeywordCategory::Secondary,
        relevance: 0.65,
        render: quality,
    },
    KeywordTemplate {
        name: "branded",
        category: KeywordCategory::Secondary,
        relevance: 0.6,
        render: branded,
    },
    KeywordTemplate {
        name: "located_quality",
        category: KeywordCategory::LongTail,
        relevance: 0.65,
        render: located_quality,
    },
    KeywordTemplate {
        name: "market",
        category: KeywordCategory::LongTail,
        relevance: 0.6,
        render: market,
    },
    KeywordTemplate {
        name: "price",
        category: KeywordCategory::Commercial,
        relevance: 0.7,
        render: price,
    },
    KeywordTemplate {
        name: "action",
        category: KeywordCategory::Commercial,
        relevance: 0.7,
        render: action,
    },
    KeywordTemplate {
        name: "question",
        category: KeywordCategory::Informational,
        relevance: 0.6,
        render: question,
    },
    KeywordTemplate {
        name: "cost_question",
        category: KeywordCategory::Informational,
        relevance: 0.6,
        render: cost_question,
    },
    KeywordTemplate {
        name: "proximity",
        category: KeywordCategory::Local,
        relevance: 0.7,
        render: proximity,
    },
    KeywordTemplate {
        name: "located",
        category: KeywordCategory::Local,
        relevance: 0.7,
        render: located,
    },
    KeywordTemplate {
        name: "urgency",
        category: KeywordCategory::Urgency,
        relevance: 0.65,
        render: urgency,
    },
];

/// Templates for one category, in registry order
pub fn templates_for(category: KeywordCategory) -> impl Iterator<Item = &'static KeywordTemplate> {
    TEMPLATES.iter().filter(move |t| t.category == category)
}

fn business_type(service: &str, _: &TemplateContext) -> Vec<String> {
    BUSINESS_TYPE_INDICATORS
        .iter()
        .filter(|indicator| !service.ends_with(*indicator))
        .map(|indicator| format!("{} {}", service, indicator))
        .collect()
}

fn quality(service: &str, _: &TemplateContext) -> Vec<String> {
    QUALITY_INDICATORS.iter().map(|q| format!("{} {}", q, service)).collect()
}

fn branded(service: &str, ctx: &TemplateContext) -> Vec<String> {
    let brand = ctx.business_name.trim().to_lowercase();
    if brand.is_empty() || service.contains(&brand) {
        return Vec::new();
    }
    vec![format!("{} {}", brand, service)]
}

fn located_quality(service: &str, ctx: &TemplateContext) -> Vec<String> {
    ctx.locations.iter().map(|loc| format!("best {} in {}", service, loc)).collect()
}

fn market(service: &str, ctx: &TemplateContext) -> Vec<String> {
    ctx.target_market.iter().map(|m| format!("{} for {}", service, m)).collect()
}

fn price(service: &str, _: &TemplateContext) -> Vec<String> {
    PRICE_WORDS.iter().map(|p| format!("{} {}", service, p)).collect()
}

fn action(service: &str, _: &TemplateContext) -> Vec<String> {
    ACTION_VERBS.iter().map(|a| format!("{} {}", a, service)).collect()
}

fn question(service: &str, _: &TemplateContext) -> Vec<String> {
    QUESTION_PHRASES.iter().map(|q| format!("{} {}", q, service)).collect()
}

fn cost_question(service: &str, _: &TemplateContext) -> Vec<String> {
    vec![format!("how much does {} cost", service)]
}

fn proximity(service: &str, _: &TemplateContext) -> Vec<String> {
    let mut out: Vec<String> = PROXIMITY_PHRASES.iter().map(|p| format!("{} {}", service, p)).collect();
    out.push(format!("local {}", service));
    out
}

fn located(service: &str, ctx: &TemplateContext) -> Vec<String> {
    ctx.locations.iter().map(|loc| format!("{} in {}", service, loc)).collect()
}

fn urgency(service: &str, _: &TemplateContext) -> Vec<String> {
    URGENCY_WORDS.iter().map(|u| format!("{} {}", u, service)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> TemplateContext {
        TemplateContext {
            business_name: "Harbour Plumbing".into(),
            locations: vec!["bristol".into(), "bath".into()],
            target_market: vec!["homeowners".into()],
        }
    }

    #[test]
    fn test_every_category_has_a_template() {
        for category in KeywordCategory::ALL {
            assert!(templates_for(category).count() > 0, "no template for {}", category);
        }
    }

    #[test]
    fn test_template_relevance_in_generated_band() {
        for template in TEMPLATES {
            assert!((0.6..=0.7).contains(&template.relevance), "{}", template.name);
        }
    }

    #[test]
    fn test_business_type_skips_redundant_suffix() {
        let out = business_type("plumbing services", &ctx());
        assert_eq!(out, vec!["plumbing services company", "plumbing services specialists"]);
    }

    #[test]
    fn test_located_uses_every_location() {
        assert_eq!(located("plumber", &ctx()), vec!["plumber in bristol", "plumber in bath"]);
        assert!(located("plumber", &TemplateContext::default()).is_empty());
    }

    #[test]
    fn test_proximity_and_urgency() {
        assert!(proximity("plumber", &ctx()).contains(&"plumber near me".to_string()));
        assert_eq!(urgency("plumber", &ctx())[0], "emergency plumber");
    }

    #[test]
    fn test_branded_needs_a_name() {
        assert_eq!(branded("boiler repair", &ctx()), vec!["harbour plumbing boiler repair"]);
        assert!(branded("boiler repair", &TemplateContext::default()).is_empty());
    }

    #[test]
    fn test_market_and_questions() {
        assert_eq!(market("boiler repair", &ctx()), vec!["boiler repair for homeowners"]);
        assert_eq!(cost_question("boiler repair", &ctx()), vec!["how much does boiler repair cost"]);
        assert_eq!(question("boiler repair", &ctx())[1], "how to choose boiler repair");
    }
}
