use crate::state::State;

/// Generates metrics in Prometheus text format.
pub fn render(state: &State) -> String {
    let mut lines = Vec::new();

    // --- Uptime ---
    lines.push("# HELP uptime_seconds Server process uptime in seconds.".to_string());
    lines.push("# TYPE uptime_seconds gauge".to_string());
    lines.push(format!("uptime_seconds {}", state.uptime().as_secs_f64()));

    // --- Active layer ---
    lines.push(
        "# HELP sharkwatch_active_layer The currently selected map layer.".to_string(),
    );
    lines.push("# TYPE sharkwatch_active_layer gauge".to_string());
    lines.push(format!(
        "sharkwatch_active_layer{{layer=\"{:?}\"}} 1",
        state.active_layer()
    ));

    // --- Points per source ---
    lines.push(
        "# HELP sharkwatch_source_points Number of canonical points held per data source."
            .to_string(),
    );
    lines.push("# TYPE sharkwatch_source_points gauge".to_string());
    for (source, count) in state.source_counts() {
        lines.push(format!(
            "sharkwatch_source_points{{source=\"{source}\"}} {count}"
        ));
    }

    // --- SSE Streams ---
    lines.push(
        "# HELP sharkwatch_open_sse_streams Number of open SSE client streams.".to_string(),
    );
    lines.push("# TYPE sharkwatch_open_sse_streams gauge".to_string());
    lines.push(format!(
        "sharkwatch_open_sse_streams {}",
        state.open_streams()
    ));

    lines.push("# HELP sharkwatch_info Build information about the server.".to_string());
    lines.push("# TYPE sharkwatch_info gauge".to_string());
    lines.push(format!(
        "sharkwatch_info{{version=\"{}\"}} 1",
        env!("GIT_TAG")
    ));

    lines.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::CARIBBEAN;
    use crate::state::Updates;
    use std::time::Duration;

    #[test]
    fn exposition_names_every_source() {
        let state = State::new(
            Updates::new(),
            &CARIBBEAN,
            10,
            10,
            10_000,
            Duration::from_secs(5),
        );
        let body = render(&state);
        assert!(body.contains("uptime_seconds"));
        assert!(body.contains("sharkwatch_active_layer{layer=\"Sighting\"} 1"));
        assert!(body.contains("sharkwatch_source_points{source=\"sightings\"} 0"));
        assert!(body.contains("sharkwatch_source_points{source=\"csv\"} 0"));
        assert!(body.contains("sharkwatch_open_sse_streams 0"));
        assert!(body.ends_with('\n'));
    }
}
