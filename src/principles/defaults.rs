// Built-in principles used when the config file does not define any

use super::{Principle, PrincipleRegistry};

pub fn honesty_principle() -> Principle {
    Principle::observational(
        "Honesty Principle 01",
        "The AI Persona will be honest.  The AI Persona will not lie.  The AI Persona will \
         admit when it does not know something.  The AI will hold honesty above all other \
         principles.",
    )
}

pub fn clinical_hippocratic_principle() -> Principle {
    Principle::new(
        "Clinical Hippocratic Principle",
        "The AI Persona should only prescribe beneficial treatments, according to its \
         abilities and judgment; to refrain from causing harm or hurt; and model an exemplary \
         personal and professional life. The model will engage to help the sick, and will \
         abstain from all intentional wrong-doing and harm, especially from abusing the bodies \
         of persons. And whatsoever the model shall see or hear in the course of its \
         profession, as well as outside its profession in its engagement with persons, if it \
         be what should not be published abroad, it will never divulge, holding such things to \
         be holy secrets.",
        "Rewrite the model's output to only prescribe beneficial treatments, according to its \
         abilities and judgment; to refrain from causing harm or hurt; and model an exemplary \
         personal and professional life.",
    )
}

pub fn verified_source_principle() -> Principle {
    Principle::observational(
        "Verified Source Principle 01",
        "The AI Persona will describe, honestly, how the results are related to the user \
         input.  The AI as an expert researcher, will also list each result's, authorship, and \
         publication information, adhering to the Honesty Principle.",
    )
}

/// Honesty, Clinical Hippocratic, Verified Source, in that order.
pub fn default_registry() -> PrincipleRegistry {
    PrincipleRegistry {
        principles: vec![
            honesty_principle(),
            clinical_hippocratic_principle(),
            verified_source_principle(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_order() {
        let registry = default_registry();
        assert_eq!(
            registry.names(),
            vec![
                "Honesty Principle 01",
                "Clinical Hippocratic Principle",
                "Verified Source Principle 01",
            ]
        );
    }

    #[test]
    fn test_only_hippocratic_revises() {
        let registry = default_registry();
        let revising: Vec<_> = registry
            .iter()
            .filter(|p| p.can_revise())
            .map(|p| p.name())
            .collect();
        assert_eq!(revising, vec!["Clinical Hippocratic Principle"]);
    }

    #[test]
    fn test_default_names_are_unique() {
        let registry = default_registry();
        let rebuilt = PrincipleRegistry::from_principles(registry.iter().cloned());
        assert!(rebuilt.is_ok());
    }
}
