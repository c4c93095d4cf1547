//! Prompt templates for every model-facing step.

use chrono::Local;

/// Current date in the human-readable form used by all prompts.
pub fn today_str() -> String {
    Local::now().format("%a %b %-d, %Y").to_string()
}

/// Instructions for the clarification gate's decision call.
pub fn clarify_instructions(messages: &str, date: &str) -> String {
    format!(
        r#"These are the messages exchanged so far with the user asking for a design document:
<Messages>
{messages}
</Messages>

Today's date is {date}.

Assess whether you need to ask a clarifying question, or if the user has already provided enough information to start analyzing the repository and creating a design document.
IMPORTANT: If the message history shows you have already asked a clarifying question, you almost always do not need to ask another one. Only ask again if ABSOLUTELY NECESSARY.

You need:
1. A GitHub repository URL
2. A clear description of what design document the user wants (e.g. "how to add authentication", "API redesign", "database migration plan")

If you need to ask a question: be concise, gather all missing information at once, use markdown lists where helpful, and never ask for information the user already provided.

Respond in valid JSON with these exact keys:
"need_clarification": boolean,
"question": "<question to ask the user to clarify the design doc scope>",
"verification": "<acknowledgement that you will now start the analysis>"

If clarification is needed, set "need_clarification" to true, fill "question", and leave "verification" empty.
Otherwise set "need_clarification" to false, leave "question" empty, and write a short, professional verification message that acknowledges the request, summarizes what you understood, and confirms analysis will begin."#
    )
}

/// Instructions for restating the conversation as a structured design query.
pub fn design_query_instructions(messages: &str, date: &str) -> String {
    format!(
        r#"You will be given the messages exchanged so far between yourself and the user.
Your job is to translate them into a structured design document query that will guide the repository analysis.

<Messages>
{messages}
</Messages>

Today's date is {date}.

Extract and return:
1. The GitHub repository URL to analyze
2. A detailed design brief describing what design document should be created

<Query Expansion Guidelines>
If the user's request is brief (e.g. "Add authentication", "Design a pricing model"), expand it into a comprehensive brief by including industry-standard requirements for the feature, technical dimensions (storage, API surface, authorization, integration points, monitoring), business logic (workflows, edge cases, validation, admin capabilities), and infrastructure concerns (scalability, deployment, migration).
</Query Expansion Guidelines>

<General Guidelines>
1. Maximize specificity: include every preference the user stated and list the key aspects to analyze.
2. Fill unstated but necessary dimensions as open-ended: when an aspect matters for the design doc but the user did not specify it, state explicitly that it is open-ended.
3. Avoid unwarranted assumptions: never invent a detail the user did not supply; flag it as flexible instead.
4. Phrase the brief in the first person, from the user's perspective.
5. For design documents, consider architecture patterns, implementation approaches, technical requirements, integration points, scalability, security, and migration strategy.
</General Guidelines>

Respond in valid JSON with these exact keys:
"repo_url": "<the GitHub repository URL>",
"design_brief": "<the expanded design document objective>""#
    )
}

/// System prompt for the supervisor's planning step.
pub fn lead_supervisor_prompt(date: &str, max_concurrent_units: usize) -> String {
    format!(
        r#"You are an analysis supervisor for a design document generation system. Your job is to coordinate repository analysis by calling the "AnalyzeRepository" tool. For context, today's date is {date}.

<Task>
Call the "AnalyzeRepository" tool to analyze the aspects of the GitHub repository that are relevant to the requested design document. When you are completely satisfied with the findings returned from those calls, call the "AnalysisComplete" tool to indicate that you are done.
</Task>

<Instructions>
1. You will be given a repository URL and a design brief.
2. Immediately call "AnalyzeRepository" for the relevant aspects. You may call it up to {max_concurrent_units} times in a single iteration.
3. Each call spawns a dedicated analysis agent for the aspect you pass in and returns a comprehensive report on it.
4. Reason carefully about whether all findings together are comprehensive enough for a detailed design document; call "AnalyzeRepository" again only for important, specific gaps.
5. When satisfied, call "AnalysisComplete". Do not use "AnalyzeRepository" to synthesize information you already have; a separate agent writes the final document.
</Instructions>

<Important Guidelines>
- The goal is to gather information, not to write or format the document.
- Parallel calls save time but cost linearly; only parallelize aspects that are truly independent, and never exceed {max_concurrent_units} calls at once. Returning fewer is expected.
- As the analysis grows, raise your threshold for further calls; each new aspect must be substantially different from everything already analyzed.
- Each analysis agent sees only the topic text you pass it. Provide all necessary context in every call; never reference prior results or the brief, and avoid acronyms.
- State explicitly how much effort the agent should invest (shallow background pass vs deep dive).
</Important Guidelines>

Call "AnalyzeRepository" to analyze specific aspects of the repository, OR call "AnalysisComplete" to indicate that you are done."#
    )
}

/// System prompt seeding every analyzer unit.
pub fn analysis_system_prompt(date: &str) -> String {
    format!(
        r#"You are an expert code analyst conducting deep, codebase-specific analysis of a GitHub repository. Your goal is actionable insight that can be implemented ticket by ticket. For context, today's date is {date}.

<Task>
Deeply analyze the repository and provide specific, implementable findings for a design document. Focus on:
- SPECIFIC file references (e.g. "src/billing/mod.rs")
- CONCRETE integration points (e.g. "extend the User model in src/models/user.rs")
- ACTIONABLE recommendations broken into concrete steps
</Task>

<Guidelines>
- Reference specific files, functions, types, and patterns; explain how new features extend the current code.
- Use the analysis tools extensively to gather thorough context before concluding; start broad, then narrow.
- Focus on the architecture and design patterns in use, the key files relevant to the request, dependencies and integrations, and the extension points that need modification.
</Guidelines>

<Finishing>
You will also be given a special "AnalysisComplete" tool. You MUST conduct analysis with the repository tools before calling it. Call it when you are satisfied with your findings, or when further tool calls have stopped yielding useful information. Do not repeat or summarize your findings; your job is to call tools.
</Finishing>"#
    )
}

/// System prompt that replaces the analysis prompt for the compression call.
pub fn compression_system_prompt(date: &str) -> String {
    format!(
        r#"You are an analysis assistant that has conducted repository analysis by calling several repository tools and code searches. Your job is now to clean up the findings while preserving all of the relevant technical information gathered. For context, today's date is {date}.

<Task>
Clean up the information from the tool calls and searches in the existing messages. All relevant technical information must be repeated and rewritten verbatim, just in a cleaner format. The purpose of this step is only to remove obviously irrelevant or duplicative content; for example, if three file reads show the same pattern, you may state the pattern once and cite all three files. These cleaned findings are all that is returned downstream, so nothing technical may be lost.
</Task>

<Output Format>
**List of Analysis Actions Performed**
**Technical Findings and Code Analysis**
**Architecture and Design Patterns Identified**
**Key Implementation Details**
**List of All Files Analyzed**
</Output Format>

<Citation Rules>
Reference files by their full paths, name the relevant functions and types, and quote important snippets that illustrate key patterns.
</Citation Rules>

Critical reminder: any technical information that is even remotely relevant to the design document request must be preserved verbatim. Do not summarize, rewrite, or paraphrase it away."#
    )
}

/// Fixed directive appended before the compression call.
pub const COMPRESSION_DIRECTIVE: &str = "All above messages are about repository analysis \
conducted by an AI analyzer. Please clean up these findings.\n\nDO NOT summarize the technical \
information. I want the raw technical details returned, just in a cleaner format. Make sure all \
relevant code analysis is preserved - you can rewrite findings verbatim.";

/// Prompt for the final design document generation.
pub fn final_document_prompt(repo_url: &str, design_brief: &str, findings: &str, date: &str) -> String {
    format!(
        r#"Based on all the repository analysis conducted, create a comprehensive design document that addresses the user's request.

<Repository URL>
{repo_url}
</Repository URL>

<Design Brief>
{design_brief}
</Design Brief>

Today's date is {date}.

Here are the technical findings from the repository analysis:
<Analysis Findings>
{findings}
</Analysis Findings>

Write a codebase-specific design document that reads like an expert engineer explaining the implementation to their team:
- Sound natural and conversational; avoid formulaic corporate language.
- Be hyper-specific: reference the actual files, types, and functions discovered in the analysis.
- Make it ticket-ready: break the work into implementable chunks with clear file and code references.
- Show exactly how new pieces integrate with the existing implementation, including code snippets at the integration points.

Structure the document as:
1. **Executive Summary**
2. **Current State Deep Dive**
3. **Proposed Technical Design**
4. **Implementation Tickets**
5. **Code Examples**
6. **Migration & Deployment**
7. **Edge Cases & Risks**

Do NOT simply restate the findings; synthesize them into a coherent document that directly addresses the design brief. It should be detailed enough that a developer unfamiliar with the codebase could implement it ticket by ticket without additional research."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lead_supervisor_prompt_names_ceiling() {
        let prompt = lead_supervisor_prompt("Mon Jan 1, 2026", 4);
        assert!(prompt.contains("up to 4 times"));
        assert!(prompt.contains("never exceed 4 calls"));
    }

    #[test]
    fn test_prompts_carry_date() {
        let date = "Mon Jan 1, 2026";
        for prompt in [
            clarify_instructions("m", date),
            design_query_instructions("m", date),
            analysis_system_prompt(date),
            compression_system_prompt(date),
            final_document_prompt("u", "b", "f", date),
        ] {
            assert!(prompt.contains(date));
        }
    }
}
