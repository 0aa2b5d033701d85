//! 活动日志合成
//!
//! 根据（查询、策略、置信度）查表生成一组可读的「思考 / 调用 / 返回」条目。
//! 纯函数：不读时钟、不访问网络，时间标签与 ID 发生器由调用方传入。

use crate::session::Strategy;

use super::entry::{ActivityLogEntry, EntryIds, LogAction, LogAgent};

/// 失败轮次的日志文案
pub const ERROR_LOG_TEXT: &str = "Failed to process request. Please try again.";

/// 置信度转百分比，四舍五入（half-up）
pub fn percent(confidence: f64) -> u32 {
    let value = (confidence * 100.0 + 0.5).floor();
    if value <= 0.0 {
        0
    } else {
        value as u32
    }
}

fn thought_template(strategy: &Strategy, query: &str) -> String {
    match strategy {
        Strategy::Vector => format!(
            "(1) The user is asking about specific information: \"{query}\". (2) I need to search the vector database for relevant documents. (3) I'll use semantic similarity to find the most relevant content."
        ),
        Strategy::KnowledgeGraph => format!(
            "(1) The user is asking about relationships or entities: \"{query}\". (2) I need to query the knowledge graph to find connections. (3) I'll search for relevant entities and their relationships."
        ),
        Strategy::Hybrid => format!(
            "(1) The user's query is complex: \"{query}\". (2) I need to combine vector search and knowledge graph queries. (3) I'll use both approaches to provide a comprehensive answer."
        ),
        Strategy::General | Strategy::Other(_) => format!(
            "(1) The user is asking a general question: \"{query}\". (2) This doesn't require specific data retrieval. (3) I can provide a helpful response using my general knowledge."
        ),
    }
}

/// 非 general 策略的调用签名与固定示意返回体（不取自真实响应）；general 与未知策略返回 None
fn api_call_template(strategy: &Strategy, query: &str) -> Option<(String, &'static str)> {
    match strategy {
        Strategy::Vector => Some((
            format!("search_vector_database(query=\"{query}\", limit=5, similarity_threshold=0.7)"),
            r#"{"results": [{"content": "Relevant document content...", "score": 0.85, "source": "doc1.md"}], "total": 3}"#,
        )),
        Strategy::KnowledgeGraph => {
            let entities = query
                .split_whitespace()
                .take(3)
                .map(|t| format!("\"{t}\""))
                .collect::<Vec<_>>()
                .join(", ");
            Some((
                format!("query_knowledge_graph(entities=[{entities}], depth=2)"),
                r#"{"entities": [{"name": "OpenAI", "type": "Organization", "relationships": [{"target": "Sam Altman", "type": "led_by"}]}], "relationships": 5}"#,
            ))
        }
        Strategy::Hybrid => Some((
            format!("hybrid_search(query=\"{query}\", vector_weight=0.6, kg_weight=0.4)"),
            r#"{"vector_results": [...], "kg_results": [...], "combined_score": 0.92}"#,
        )),
        Strategy::General | Strategy::Other(_) => None,
    }
}

fn final_thought(strategy: &Strategy, confidence: f64) -> String {
    format!(
        "(1) I have successfully processed the query using {} strategy. (2) The confidence level is {}%. (3) I will now provide a comprehensive response to the user.",
        strategy,
        percent(confidence)
    )
}

/// 为一次成功的轮次生成日志：general 2 条，其余策略 4 条
pub fn synthesize(
    query: &str,
    strategy: &Strategy,
    confidence: f64,
    time: &str,
    ids: &mut EntryIds,
) -> Vec<ActivityLogEntry> {
    let mut entries = Vec::with_capacity(4);
    entries.push(ids.entry(
        LogAgent::Assistant,
        time,
        LogAction::Thought,
        thought_template(strategy, query),
    ));

    if let Some((request, response)) = api_call_template(strategy, query) {
        entries.push(ids.entry(LogAgent::Assistant, time, LogAction::ApiRequest, request));
        entries.push(ids.entry(LogAgent::Assistant, time, LogAction::ApiResponse, response));
    }

    entries.push(ids.entry(
        LogAgent::Assistant,
        time,
        LogAction::Thought,
        final_thought(strategy, confidence),
    ));
    entries
}

/// 轮次开始：用户任务条目
pub fn enter_task(query: &str, time: &str, ids: &mut EntryIds) -> ActivityLogEntry {
    ids.entry(LogAgent::Customer, time, LogAction::EnterTask, query)
}

/// 轮次失败：单条 Error 条目
pub fn error_entry(time: &str, ids: &mut EntryIds) -> ActivityLogEntry {
    ids.entry(LogAgent::Assistant, time, LogAction::Error, ERROR_LOG_TEXT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actions(entries: &[ActivityLogEntry]) -> Vec<LogAction> {
        entries.iter().map(|e| e.action).collect()
    }

    #[test]
    fn test_general_yields_two_thoughts() {
        let mut ids = EntryIds::new();
        let entries = synthesize("hello", &Strategy::General, 0.5, "10:00:00", &mut ids);
        assert_eq!(actions(&entries), vec![LogAction::Thought, LogAction::Thought]);
        assert!(entries[0].content.contains("general question: \"hello\""));
    }

    #[test]
    fn test_non_general_yields_four_entries() {
        for strategy in [Strategy::Vector, Strategy::KnowledgeGraph, Strategy::Hybrid] {
            let mut ids = EntryIds::new();
            let entries = synthesize("find docs", &strategy, 0.7, "10:00:00", &mut ids);
            assert_eq!(
                actions(&entries),
                vec![
                    LogAction::Thought,
                    LogAction::ApiRequest,
                    LogAction::ApiResponse,
                    LogAction::Thought
                ],
                "strategy {}",
                strategy
            );
        }
    }

    #[test]
    fn test_unknown_strategy_uses_general_templates() {
        let mut ids = EntryIds::new();
        let strategy = Strategy::from("graph_rag");
        let entries = synthesize("q", &strategy, 0.3, "10:00:00", &mut ids);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].content.contains("general question"));
        assert!(entries[1].content.contains("using graph_rag strategy"));
    }

    #[test]
    fn test_knowledge_graph_request_takes_first_three_tokens() {
        let mut ids = EntryIds::new();
        let entries = synthesize(
            "What is   OpenAI? and more",
            &Strategy::KnowledgeGraph,
            0.91,
            "10:00:00",
            &mut ids,
        );
        assert_eq!(
            entries[1].content,
            "query_knowledge_graph(entities=[\"What\", \"is\", \"OpenAI?\"], depth=2)"
        );
        assert!(entries[2].content.contains("\"Organization\""));
        assert!(entries[3].content.contains("91%"));
    }

    #[test]
    fn test_vector_and_hybrid_requests_interpolate_query() {
        let mut ids = EntryIds::new();
        let v = synthesize("rust docs", &Strategy::Vector, 0.8, "t", &mut ids);
        assert_eq!(
            v[1].content,
            "search_vector_database(query=\"rust docs\", limit=5, similarity_threshold=0.7)"
        );
        let h = synthesize("rust docs", &Strategy::Hybrid, 0.8, "t", &mut ids);
        assert_eq!(
            h[1].content,
            "hybrid_search(query=\"rust docs\", vector_weight=0.6, kg_weight=0.4)"
        );
    }

    #[test]
    fn test_percent_rounds_half_up() {
        assert_eq!(percent(0.846), 85);
        assert_eq!(percent(0.844), 84);
        assert_eq!(percent(0.0), 0);
        assert_eq!(percent(1.0), 100);
    }

    #[test]
    fn test_deterministic() {
        let mut a = EntryIds::new();
        let mut b = EntryIds::new();
        let x = synthesize("same", &Strategy::Hybrid, 0.42, "09:15:00", &mut a);
        let y = synthesize("same", &Strategy::Hybrid, 0.42, "09:15:00", &mut b);
        assert_eq!(x, y);
    }

    #[test]
    fn test_ids_continue_across_calls() {
        let mut ids = EntryIds::new();
        let task = enter_task("q", "t", &mut ids);
        let entries = synthesize("q", &Strategy::General, 0.5, "t", &mut ids);
        let err = error_entry("t", &mut ids);
        assert_eq!(task.id, 0);
        assert_eq!(entries[0].id, 1);
        assert_eq!(entries[1].id, 2);
        assert_eq!(err.id, 3);
        assert_eq!(err.agent, LogAgent::Assistant);
        assert_eq!(task.agent, LogAgent::Customer);
        assert_eq!(err.content, ERROR_LOG_TEXT);
    }
}
