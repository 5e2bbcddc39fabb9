// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal:
// training a network, or classifying images with one.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No argument parsing here (that's Layer 1)
//   - Only workflow coordination

// The training workflow
pub mod train_use_case;

// The image classification workflow
pub mod predict_use_case;
