//! Prompt text for the three model-facing surfaces: resume parsing, the live
//! interviewer persona, and report generation.

use crate::shared::{CandidateProfile, Turn};

/// Fixed prebuilt voice for the interviewer. Professional, calm tone.
pub const INTERVIEWER_VOICE: &str = "Puck";

/// Prompt for extracting a structured profile from raw resume text.
pub const RESUME_PARSER_PROMPT: &str = r#"
Extract the following information from the provided resume text.
Return ONLY a valid JSON object.
DO NOT hallucinate.
If information is missing, use reasonable defaults or empty arrays.

Schema:
{
  "name": "string",
  "email": "string",
  "experienceYears": number,
  "domain": "string (e.g. Frontend Engineering, Data Science)",
  "seniority": "string (Junior, Mid, Senior, Lead)",
  "skills": ["string"],
  "summary": "short string"
}
"#;

/// System instructions for the live interviewer, parameterized by the
/// candidate profile. The remote peer never speaks unprompted; rule 1 plus
/// the session's priming message force it to open the interview.
pub fn interviewer_instructions(profile: &CandidateProfile) -> String {
    format!(
        "You are a senior technical interviewer at a Tier-1 tech company.\n\
         Your goal is to conduct a professional, voice-based interview for the following candidate:\n\
         Domain: {}\n\
         Seniority: {}\n\
         Skills: {}\n\
         \n\
         MANDATORY RULES:\n\
         1. YOU START THE INTERVIEW. Immediately introduce yourself and ask the first question as soon as the session begins.\n\
         2. Conduct a real-time voice interview. Be human, professional, calm, and realistic.\n\
         3. RESPONSES MUST BE CONCISE: 2-3 sentences max. This is critical for voice flow.\n\
         4. Adapt difficulty: If they struggle, probe deeper on fundamentals. If they excel, ask harder architectural/scenario questions.\n\
         5. NEVER reveal scores, feedback, or internal evaluations during the interview.\n\
         6. Close the interview professionally when you have enough data (approx 5-7 questions).\n\
         7. Use a natural corporate tone, not robotic.",
        profile.domain,
        profile.seniority,
        profile.skills.join(", "),
    )
}

/// Prompt for the report generator, embedding the ordered interview turns.
pub fn report_prompt(profile: &CandidateProfile, turns: &[Turn]) -> String {
    let history = turns
        .iter()
        .map(|t| format!("Q: {}\nA: {}", t.question, t.answer))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Generate a comprehensive career assessment report based on the candidate's resume and interview performance.\n\
         Candidate Domain: {}\n\
         Seniority: {}\n\
         \n\
         Interview History (Question & Answer):\n\
         {}\n\
         \n\
         Return ONLY a JSON object matching this schema:\n\
         {{\n\
           \"overallScores\": {{\n\
             \"technicalKnowledge\": number (0-100),\n\
             \"problemSolving\": number (0-100),\n\
             \"communication\": number (0-100),\n\
             \"confidence\": number (0-100)\n\
           }},\n\
           \"industryReadiness\": \"string\",\n\
           \"strengths\": [\"string\"],\n\
           \"areasToImprove\": [\"string\"],\n\
           \"hiringRecommendation\": \"string (Strong Hire, Hire, Leaning No, Reject)\",\n\
           \"resumeScore\": number (0-100),\n\
           \"atsCompatibility\": \"string (High, Medium, Low)\",\n\
           \"skillGaps\": [\"string\"],\n\
           \"threeMonthPlan\": [\"string\"],\n\
           \"recommendedCertifications\": [\"string\"],\n\
           \"suitableJobRoles\": [\"string\"]\n\
         }}",
        profile.domain, profile.seniority, history,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile() -> CandidateProfile {
        CandidateProfile {
            name: "Sam".into(),
            email: "sam@example.com".into(),
            experience_years: 4.0,
            domain: "Data Science".into(),
            seniority: "Mid".into(),
            skills: vec!["Python".into(), "SQL".into()],
            summary: String::new(),
        }
    }

    #[test]
    fn instructions_embed_profile() {
        let text = interviewer_instructions(&sample_profile());
        assert!(text.contains("Domain: Data Science"));
        assert!(text.contains("Seniority: Mid"));
        assert!(text.contains("Python, SQL"));
        assert!(text.contains("YOU START THE INTERVIEW"));
    }

    #[test]
    fn report_prompt_embeds_turns_in_order() {
        let turns = vec![
            Turn { question: "Q1".into(), answer: "A1".into() },
            Turn { question: "Q2".into(), answer: "A2".into() },
        ];
        let text = report_prompt(&sample_profile(), &turns);
        let q1 = text.find("Q: Q1").unwrap();
        let q2 = text.find("Q: Q2").unwrap();
        assert!(q1 < q2);
        assert!(text.contains("A: A2"));
        assert!(text.contains("\"overallScores\""));
    }
}
