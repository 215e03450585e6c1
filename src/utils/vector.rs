//! utils/vector.rs
//! Similitud coseno y ranking sobre embeddings guardados como JSON.

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Devuelve hasta `limit` candidatos con similitud >= `threshold`, de mayor a menor.
pub fn top_matches<T>(
    query: &[f32],
    candidates: Vec<(T, Vec<f32>)>,
    threshold: f32,
    limit: usize,
) -> Vec<(T, f32)> {
    let mut scored: Vec<(T, f32)> = candidates
        .into_iter()
        .map(|(item, emb)| {
            let sim = cosine_similarity(query, &emb);
            (item, sim)
        })
        .filter(|(_, sim)| *sim >= threshold)
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    scored
}

pub fn encode_embedding(embedding: &[f32]) -> anyhow::Result<String> {
    Ok(serde_json::to_string(embedding)?)
}

/// Embeddings corruptos se ignoran en lugar de romper la búsqueda.
pub fn decode_embedding(raw: &str) -> Option<Vec<f32>> {
    serde_json::from_str(raw).ok()
}
