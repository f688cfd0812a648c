//! Building positioners and stacks from descriptions, and the reverse.

use nalgebra::{Matrix4, Vector3};

use kinecal_chain::{Joint, Positioner, PositioningStack};
use kinecal_core::math::{from_rows, is_finite_matrix, to_rows};

use crate::error::DescriptionError;
use crate::generate::check_joint_names;
use crate::schema::{
    InstrumentDescription, JointDescription, LinkDescription, PositionerDescription,
};

// ---------------------------------------------------------------------------
// Positioners
// ---------------------------------------------------------------------------

impl JointDescription {
    /// Build the joint at its home offset.
    pub fn to_joint(&self) -> Result<Joint, DescriptionError> {
        let joint = Joint::new(
            self.name.as_str(),
            self.kind,
            Vector3::from(self.axis),
            Vector3::from(self.origin),
        )?
        .with_limits(
            self.lower_limit.unwrap_or(f64::NEG_INFINITY),
            self.upper_limit.unwrap_or(f64::INFINITY),
        )?
        .with_home_offset(self.home_offset);
        Ok(joint)
    }

    fn from_joint(joint: &Joint, parent: &str, child: &str) -> Self {
        let finite = |v: f64| v.is_finite().then_some(v);
        Self {
            name: joint.name().to_owned(),
            kind: joint.kind(),
            parent: parent.to_owned(),
            child: child.to_owned(),
            axis: joint.axis().into_inner().into(),
            origin: (*joint.origin()).into(),
            lower_limit: finite(joint.lower_limit()),
            upper_limit: finite(joint.upper_limit()),
            home_offset: joint.home_offset(),
        }
    }
}

fn checked_matrix(
    rows: &[[f64; 4]; 4],
    positioner: &str,
    which: &'static str,
) -> Result<Matrix4<f64>, DescriptionError> {
    let m = from_rows(rows);
    if is_finite_matrix(&m) {
        Ok(m)
    } else {
        Err(DescriptionError::NonFiniteTransform {
            positioner: positioner.into(),
            which,
        })
    }
}

impl PositionerDescription {
    /// Validate the description and build the positioner it describes.
    ///
    /// Joints start at their home offsets.
    pub fn to_positioner(&self) -> Result<Positioner, DescriptionError> {
        if self.name.trim().is_empty() {
            return Err(DescriptionError::EmptyName("positioner".into()));
        }
        check_joint_names(self.joints.iter().map(|j| j.name.as_str()))?;
        self.display_order()?;
        let base = checked_matrix(&self.base, &self.name, "base")?;
        let tool = checked_matrix(&self.tool, &self.name, "tool")?;

        let joints = self
            .joints
            .iter()
            .map(JointDescription::to_joint)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Positioner::new(self.name.as_str(), joints)?
            .with_base(base)
            .with_tool(tool))
    }

    /// Describe an existing positioner. Links follow the `base`,
    /// `<joint> link` naming used by the generator.
    pub fn from_positioner(positioner: &Positioner) -> Self {
        let links: Vec<LinkDescription> = std::iter::once(LinkDescription::new("base"))
            .chain(
                positioner
                    .joints()
                    .iter()
                    .map(|j| LinkDescription::new(format!("{} link", j.name()))),
            )
            .collect();
        let joints = positioner
            .joints()
            .iter()
            .enumerate()
            .map(|(i, joint)| JointDescription::from_joint(joint, &links[i].name, &links[i + 1].name))
            .collect();

        Self {
            name: positioner.name().to_owned(),
            base: to_rows(positioner.base()),
            tool: to_rows(positioner.tool()),
            custom_order: None,
            joints,
            links,
        }
    }
}

// ---------------------------------------------------------------------------
// Stacks
// ---------------------------------------------------------------------------

impl InstrumentDescription {
    /// Build the named positioning stack.
    ///
    /// The first listed positioner is the main chain and keeps its base. Each
    /// auxiliary's described base becomes its attachment transform and its
    /// own base is reset to identity.
    pub fn build_stack(&self, name: &str) -> Result<PositioningStack, DescriptionError> {
        let stack = self.stack(name)?;
        let Some((main, auxiliary)) = stack.positioners.split_first() else {
            return Err(DescriptionError::EmptyStack(stack.name.clone()));
        };

        let mut built = PositioningStack::new(stack.name.as_str(), self.positioner(main)?.to_positioner()?)
            .with_composition(stack.composition);
        for aux in auxiliary {
            let mut positioner = self.positioner(aux)?.to_positioner()?;
            let attachment = *positioner.base();
            positioner.set_base(Matrix4::identity());
            built.add_auxiliary(positioner, attachment);
        }
        Ok(built)
    }

    /// Check every positioner and stack can be built.
    pub fn validate(&self) -> Result<(), DescriptionError> {
        if self.name.trim().is_empty() {
            return Err(DescriptionError::EmptyName("instrument".into()));
        }
        for positioner in &self.positioners {
            positioner.to_positioner()?;
        }
        for stack in &self.positioning_stacks {
            if stack.name.trim().is_empty() {
                return Err(DescriptionError::EmptyName("positioning stack".into()));
            }
            self.build_stack(&stack.name)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// StackSelector
// ---------------------------------------------------------------------------

/// Holds an instrument description and the currently active stack.
///
/// Selecting a stack always builds it afresh from the description, so joint
/// values set on a previously active stack are discarded.
#[derive(Debug, Clone)]
pub struct StackSelector {
    description: InstrumentDescription,
    active: Option<PositioningStack>,
}

impl StackSelector {
    /// Validate `description` and hold it with no active stack.
    pub fn new(description: InstrumentDescription) -> Result<Self, DescriptionError> {
        description.validate()?;
        Ok(Self {
            description,
            active: None,
        })
    }

    pub const fn description(&self) -> &InstrumentDescription {
        &self.description
    }

    pub fn stack_names(&self) -> Vec<&str> {
        self.description.stack_names()
    }

    /// Build and activate the named stack.
    pub fn select(&mut self, name: &str) -> Result<&mut PositioningStack, DescriptionError> {
        let stack = self.description.build_stack(name)?;
        tracing::info!(stack = name, dof = stack.dof(), "positioning stack selected");
        Ok(self.active.insert(stack))
    }

    pub const fn active(&self) -> Option<&PositioningStack> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut PositioningStack> {
        self.active.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use kinecal_chain::{ChainError, Composition};
    use kinecal_core::math::{translation, translation_of};
    use std::f64::consts::PI;

    fn table() -> Positioner {
        let x = Joint::prismatic("X", Vector3::x(), Vector3::zeros())
            .unwrap()
            .with_limits(-200.0, 200.0)
            .unwrap();
        let omega = Joint::revolute("Omega", Vector3::z(), Vector3::new(0.0, 0.0, 100.0))
            .unwrap()
            .with_limits(-PI, PI)
            .unwrap()
            .with_home_offset(0.25);
        Positioner::new("Table", vec![x, omega])
            .unwrap()
            .with_tool(translation(&Vector3::new(10.0, 0.0, 0.0)))
    }

    fn chi() -> Positioner {
        let chi = Joint::revolute("Chi", Vector3::x(), Vector3::zeros()).unwrap();
        Positioner::new("Chi Cradle", vec![chi])
            .unwrap()
            .with_base(translation(&Vector3::new(0.0, 0.0, 20.0)))
    }

    #[test]
    fn from_positioner_round_trips() {
        let original = table();
        let description = PositionerDescription::from_positioner(&original);
        assert_eq!(description.joints[1].parent, "X link");
        assert_eq!(description.joints[1].child, "Omega link");
        assert_eq!(description.joints[1].lower_limit, Some(-PI));

        let rebuilt = description.to_positioner().unwrap();
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn unbounded_limits_are_omitted() {
        let description = PositionerDescription::from_positioner(&chi());
        assert_eq!(description.joints[0].lower_limit, None);
        assert_eq!(description.joints[0].upper_limit, None);
        let json = serde_json::to_string(&description).unwrap();
        assert!(!json.contains("lower_limit"));
    }

    #[test]
    fn to_positioner_rejects_invalid_descriptions() {
        let valid = PositionerDescription::from_positioner(&table());

        let mut d = valid.clone();
        d.joints[1].name = "X".into();
        assert!(matches!(d.to_positioner(), Err(DescriptionError::DuplicateName(_))));

        let mut d = valid.clone();
        d.joints[0].axis = [0.0; 3];
        assert!(matches!(
            d.to_positioner(),
            Err(DescriptionError::Chain(ChainError::ZeroAxis(_)))
        ));

        let mut d = valid.clone();
        d.joints[0].lower_limit = Some(300.0);
        assert!(matches!(
            d.to_positioner(),
            Err(DescriptionError::Chain(ChainError::InvalidLimits { .. }))
        ));

        let mut d = valid.clone();
        d.tool[0][3] = f64::NAN;
        assert!(matches!(
            d.to_positioner(),
            Err(DescriptionError::NonFiniteTransform { which: "tool", .. })
        ));

        let mut d = valid;
        d.joints.clear();
        assert!(matches!(
            d.to_positioner(),
            Err(DescriptionError::Chain(ChainError::EmptyChain(_)))
        ));
    }

    fn instrument() -> InstrumentDescription {
        let mut instrument =
            InstrumentDescription::from_positioner(PositionerDescription::from_positioner(&table()));
        instrument
            .positioners
            .push(PositionerDescription::from_positioner(&chi()));
        instrument.positioning_stacks.push(crate::schema::StackDescription {
            name: "Table + Chi".into(),
            positioners: vec!["Table".into(), "Chi Cradle".into()],
            composition: Composition::Serial,
        });
        instrument
    }

    #[test]
    fn auxiliary_base_becomes_attachment() {
        let stack = instrument().build_stack("Table + Chi").unwrap();
        assert_eq!(stack.dof(), 3);
        let aux = &stack.auxiliary()[0];
        assert_eq!(*aux.positioner.base(), Matrix4::identity());
        assert_eq!(aux.base, translation(&Vector3::new(0.0, 0.0, 20.0)));
        assert_eq!(stack.configuration(), vec![0.0, 0.25, 0.0]);
    }

    #[test]
    fn selecting_a_stack_discards_previous_configuration() {
        let mut selector = StackSelector::new(instrument()).unwrap();
        assert_eq!(selector.stack_names(), vec!["Table", "Table + Chi"]);
        assert!(selector.active().is_none());

        let stack = selector.select("Table + Chi").unwrap();
        stack.set_configuration(&[50.0, 0.0, 0.5]).unwrap();
        let pose = stack.pose();
        // table top at z=100, tool offset +10 in x, chi attached 20 above
        assert_relative_eq!(
            translation_of(&pose),
            Vector3::new(60.0, 0.0, 120.0),
            epsilon = 1e-12
        );

        selector.select("Table").unwrap();
        let stack = selector.select("Table + Chi").unwrap();
        assert_eq!(stack.configuration(), vec![0.0, 0.25, 0.0]);
        assert!(matches!(
            selector.select("Detector"),
            Err(DescriptionError::UnknownStack(_))
        ));
    }

    #[test]
    fn selector_rejects_broken_instruments() {
        let mut broken = instrument();
        broken.positioning_stacks[1].positioners.push("Missing".into());
        assert!(matches!(
            StackSelector::new(broken),
            Err(DescriptionError::UnknownPositioner(name)) if name == "Missing"
        ));

        let mut empty = instrument();
        empty.positioning_stacks[1].positioners.clear();
        assert!(matches!(
            StackSelector::new(empty),
            Err(DescriptionError::EmptyStack(_))
        ));

        let mut blank = instrument();
        blank.positioners[1].joints[0].name = " ".into();
        assert!(matches!(
            StackSelector::new(blank),
            Err(DescriptionError::EmptyName(_))
        ));
    }
}
