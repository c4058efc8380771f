pub mod congestion_control_feedback;
