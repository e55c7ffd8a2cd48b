//! Static question lists and the fixed protocol text for each mode.

use crate::domain::model::{Mode, Question, QuestionOption};

const fn opt(id: &'static str, title: &'static str, description: &'static str) -> QuestionOption {
    QuestionOption {
        id,
        title,
        description,
    }
}

static UTILITY_QUESTIONS: &[Question] = &[
    Question {
        ordinal: 0,
        parameter: "Primary Function",
        prompt: "If coffee had one job to do for you, what would it be?",
        systems_concept: "This defines the CORE UTILITY FUNCTION of your system. Every downstream parameter, from bean type to dosage, is determined from this point.",
        options: &[
            opt("alertness", "Shock Awake", "To shock my nervous system awake and achieve alertness as fast as possible."),
            opt("thinking", "Improve Thinking", "To improve thinking and focus once I'm already awake."),
            opt("steady-energy", "Steady Energy", "To provide steady energy without common side effects like jitters or anxiety."),
            opt("appetite", "Appetite Control", "To suppress my appetite."),
        ],
    },
    Question {
        ordinal: 1,
        parameter: "Key Constraint",
        prompt: "If you could optimize for only one practical priority, which would it be?",
        systems_concept: "This identifies the NON-NEGOTIABLE CONSTRAINT: the primary bottleneck around which your entire system must be designed.",
        options: &[
            opt("time", "Time (Speed)", "Speed is everything."),
            opt("consistency", "Consistency (Reliability)", "Same results every time."),
            opt("cost", "Cost (Efficiency)", "Budget-friendly above all."),
        ],
    },
    Question {
        ordinal: 2,
        parameter: "Time Budget",
        prompt: "What is the maximum amount of hands-on time you are willing to invest per session?",
        systems_concept: "This sets a HARD OPERATIONAL BOUNDARY, forcing trade-offs between complexity, quality, and resource expenditure.",
        options: &[
            opt("2", "2 minutes", "Bare minimum - I'm in a rush."),
            opt("5", "5 minutes", "Reasonable - I can take a moment."),
            opt("8", "8 minutes", "I can indulge in the process."),
        ],
    },
    Question {
        ordinal: 3,
        parameter: "Cost Parameter",
        prompt: "What is your acceptable cost per cup?",
        systems_concept: "This quantifies the INPUT RESOURCE BUDGET, directly linking financial investment to the quality and sourcing of system inputs.",
        options: &[
            opt("under-50", "Under $0.50", "Minimal cost per serving."),
            opt("50-100", "$0.50–$1.00", "Moderate investment."),
            opt("100-200", "$1.00–$2.00", "Premium quality acceptable."),
        ],
    },
    Question {
        ordinal: 4,
        parameter: "Operating Environment",
        prompt: "Where must this coffee system reliably function?",
        systems_concept: "This determines the CONTEXTUAL ENVELOPE: the external conditions (stability, space, tools) your system must be robust enough to withstand.",
        options: &[
            opt("home", "Home", "Quiet, controlled space."),
            opt("office", "Office", "Shared, busy environment."),
            opt("travel", "Travel", "On the go, portable setup."),
        ],
    },
];

static RITUAL_QUESTIONS: &[Question] = &[
    Question {
        ordinal: 0,
        parameter: "Core Purpose",
        prompt: "What is the primary directive of your ritual?",
        systems_concept: "This defines your system's PURPOSE. It is the primary feedback loop you are optimizing for and the ultimate metric of success.",
        options: &[
            opt("agency", "Agency", "The feeling of being the cause, not just the effect."),
            opt("grounding", "Grounding", "A sensory pull that centers you, from the scent of the beans to the sound of a heavy pour."),
            opt("craft", "Craft / Personalization", "A signature touch that makes the experience distinctly yours."),
            opt("warmth", "Warmth / Connection", "A sense of spaciousness or connection to natural elements."),
        ],
    },
    Question {
        ordinal: 1,
        parameter: "Temporal Resolution",
        prompt: "Would you like your ritual to reflect changes in the seasons or calendar?",
        systems_concept: "This determines your system's ADAPTATION FREQUENCY. A 'Yes' integrates external time as a key input, creating a responsive and evolving ritual.",
        options: &[
            opt("no", "No", "Static system - no seasonal changes."),
            opt("weekly", "Yes, weekly", "High-frequency adaptation."),
            opt("monthly", "Yes, monthly", "Medium-frequency calibration."),
            opt("seasonal", "Yes, seasonally", "Low-frequency, macro-adaptation."),
        ],
    },
    Question {
        ordinal: 2,
        parameter: "Enabling Constraint",
        prompt: "How critical is the mug or tumbler to the experience?",
        systems_concept: "This defines a KEY INTERFACE COMPONENT. Its importance dictates whether it is merely a container or a core variable shaping the entire outcome.",
        options: &[
            opt("low", "Low", "Just a container - function over form."),
            opt("medium", "Medium", "Nice to have - adds to the experience."),
            opt("high", "High", "Essential - the vessel defines the ritual."),
        ],
    },
    Question {
        ordinal: 3,
        parameter: "Maintenance Protocol",
        prompt: "How will you know your ritual needs adjusting?",
        systems_concept: "This establishes your SYSTEM MONITORING RULE. It specifies the trigger, whether an internal signal or a calendar event, for iterative maintenance.",
        options: &[
            opt("chore", "Feels like a chore", "Adjust when the joy fades."),
            opt("scattered", "Mornings feel scattered", "Adjust when it stops working."),
            opt("seasonal-review", "Seasonal review", "Review and recalibrate every 3 months."),
        ],
    },
    Question {
        ordinal: 4,
        parameter: "Feedback Mechanism",
        prompt: "How will you measure your ritual's success?",
        systems_concept: "This defines your MEASUREMENT AND FEEDBACK LOOP. A system without measurement cannot be improved.",
        options: &[
            opt("daily-check", "Daily check-in", "A quick 1-5 rating in my journal."),
            opt("weekly-review", "Weekly review", "Sundays: Did my mornings feel better this week?"),
            opt("outcome-tracking", "Outcome tracking", "Track energy levels, mood, or productivity metrics."),
            opt("intuitive", "Intuitive sense", "I'll just know. It's a feeling, not a metric."),
        ],
    },
];

pub fn questions_for(mode: Mode) -> &'static [Question] {
    match mode {
        Mode::Utility => UTILITY_QUESTIONS,
        Mode::Ritual => RITUAL_QUESTIONS,
    }
}

/// Parameter whose answer drives the protocol objective line.
pub fn purpose_parameter(mode: Mode) -> &'static str {
    match mode {
        Mode::Utility => "Primary Function",
        Mode::Ritual => "Core Purpose",
    }
}

pub fn sequence_steps(mode: Mode) -> &'static [&'static str] {
    match mode {
        Mode::Utility => &[
            "Prepare equipment according to time budget",
            "Measure inputs based on cost parameter",
            "Execute brew method optimized for environment",
            "Consume within optimal window for function",
        ],
        Mode::Ritual => &[
            "Set up space according to vessel importance",
            "Engage in sensory preparation (smell, sound, touch)",
            "Execute ritual sequence with intentional pacing",
            "Complete with designated reflection period",
        ],
    }
}

pub fn failure_conditions(mode: Mode) -> &'static [&'static str] {
    match mode {
        Mode::Utility => &[
            "Rushing preparation beyond time budget",
            "Compromising on key constraint for convenience",
            "Operating outside designated environment",
        ],
        Mode::Ritual => &[
            "Skipping steps or rushing sequence",
            "Ignoring maintenance protocol triggers",
            "Allowing external interruptions",
        ],
    }
}

pub fn repeat_instruction(mode: Mode) -> &'static str {
    match mode {
        Mode::Utility => {
            "Execute daily before first work session. Do not modify more than one variable at a time."
        }
        Mode::Ritual => "Execute upon waking, before digital exposure. Deviation reduces reliability.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_mode_has_five_ordered_questions() {
        for mode in Mode::ALL {
            let questions = questions_for(mode);
            assert_eq!(questions.len(), 5);
            for (index, question) in questions.iter().enumerate() {
                assert_eq!(question.ordinal, index);
                assert!(!question.options.is_empty());
            }
        }
    }

    #[test]
    fn test_option_ids_unique_per_question() {
        for mode in Mode::ALL {
            for question in questions_for(mode) {
                let ids: HashSet<&str> = question.options.iter().map(|o| o.id).collect();
                assert_eq!(ids.len(), question.options.len(), "{}", question.parameter);
            }
        }
    }

    #[test]
    fn test_purpose_parameter_is_first_question() {
        for mode in Mode::ALL {
            assert_eq!(questions_for(mode)[0].parameter, purpose_parameter(mode));
        }
    }
}
