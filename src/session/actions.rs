//! User actions, one per control

use serde::{Deserialize, Serialize};

use crate::availability::{LandCoverKind, RestorationType};
use crate::geometry::ProjectArea;
use crate::priority::PriorityFactor;
use crate::stats::ProjectParameter;

use super::view::ReferenceLayer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    SelectCountry { name: String },
    SetLandCover { kind: LandCoverKind, enabled: bool },
    SetRestorationType { kind: RestorationType, enabled: bool },
    SetWeight { factor: PriorityFactor, value: u8 },
    DisplayAvailableArea,
    DisplayLayer { factor: PriorityFactor },
    RunAnalysis,
    Reset,
    DrawShape { area: ProjectArea },
    EditShape { area: ProjectArea },
    ClearDrawings,
    SetProjectParameter { param: ProjectParameter, value: f64 },
    SetReferenceLayer { layer: ReferenceLayer, visible: bool },
}

impl Action {
    /// Draw and edit events start a debounce window
    pub fn is_shape_event(&self) -> bool {
        matches!(self, Action::DrawShape { .. } | Action::EditShape { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Action::SelectCountry { .. } => "select_country",
            Action::SetLandCover { .. } => "set_land_cover",
            Action::SetRestorationType { .. } => "set_restoration_type",
            Action::SetWeight { .. } => "set_weight",
            Action::DisplayAvailableArea => "display_available_area",
            Action::DisplayLayer { .. } => "display_layer",
            Action::RunAnalysis => "run_analysis",
            Action::Reset => "reset",
            Action::DrawShape { .. } => "draw_shape",
            Action::EditShape { .. } => "edit_shape",
            Action::ClearDrawings => "clear_drawings",
            Action::SetProjectParameter { .. } => "set_project_parameter",
            Action::SetReferenceLayer { .. } => "set_reference_layer",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_json_shape() {
        let action: Action = serde_json::from_str(
            r#"{"type":"set_weight","factor":"opportunity_cost","value":3}"#,
        ).unwrap();
        assert_eq!(action, Action::SetWeight { factor: PriorityFactor::OpportunityCost, value: 3 });

        let draw: Action = serde_json::from_str(
            r#"{"type":"draw_shape","area":{"shape":"rectangle","west":0,"south":0,"east":1,"north":1}}"#,
        ).unwrap();
        assert!(draw.is_shape_event());
        assert_eq!(draw.kind(), "draw_shape");

        let run: Action = serde_json::from_str(r#"{"type":"run_analysis"}"#).unwrap();
        assert_eq!(run, Action::RunAnalysis);

        let layer: Action = serde_json::from_str(
            r#"{"type":"set_reference_layer","layer":"historical_forest","visible":true}"#,
        ).unwrap();
        assert_eq!(layer, Action::SetReferenceLayer { layer: ReferenceLayer::HistoricalForest, visible: true });
    }

    #[test]
    fn test_settle_is_not_a_client_action() {
        assert!(serde_json::from_str::<Action>(r#"{"type":"settle_shape"}"#).is_err());
    }
}
