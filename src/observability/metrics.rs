use metrics::{counter, describe_counter};

/// Register metric descriptions with the installed recorder.
///
/// Without a recorder every call below is a no-op.
pub fn init_metrics() {
    describe_counter!(
        "sgl_picker_branch_total",
        "Picker decisions by picker and decision path"
    );
    describe_counter!(
        "sgl_picker_decisions_total",
        "Picker decisions by picker and selected endpoint"
    );
}

pub struct Metrics;

impl Metrics {
    pub fn record_picker_branch(picker: &'static str, branch: &'static str) {
        counter!("sgl_picker_branch_total",
            "picker" => picker,
            "branch" => branch
        )
        .increment(1);
    }

    pub fn record_picker_decision(picker: &'static str, endpoint: &str) {
        counter!("sgl_picker_decisions_total",
            "picker" => picker,
            "endpoint" => endpoint.to_string()
        )
        .increment(1);
    }
}
