//! BPMN element taxonomy.
//!
//! `BpmnType` covers the concrete element types a diagram can contain plus
//! the abstract supertypes rule and layout queries are phrased in
//! (`FlowNode`, `InteractionNode`, `FlowElementsContainer`, …). The
//! supertype lattice follows the BPMN 2.0 metamodel, including its multiple
//! inheritance (a `Task` is both an `Activity` and an `InteractionNode`).

use serde::de::IntoDeserializer;
use serde::de::value::StrDeserializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A BPMN metamodel type, serialized with its `bpmn:` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BpmnType {
    // ─── Abstract ────────────────────────────────────────────────────────
    #[serde(rename = "bpmn:BaseElement")]
    BaseElement,
    #[serde(rename = "bpmn:FlowElement")]
    FlowElement,
    #[serde(rename = "bpmn:FlowNode")]
    FlowNode,
    #[serde(rename = "bpmn:InteractionNode")]
    InteractionNode,
    #[serde(rename = "bpmn:FlowElementsContainer")]
    FlowElementsContainer,
    #[serde(rename = "bpmn:Activity")]
    Activity,
    #[serde(rename = "bpmn:Event")]
    Event,
    #[serde(rename = "bpmn:ThrowEvent")]
    ThrowEvent,
    #[serde(rename = "bpmn:CatchEvent")]
    CatchEvent,
    #[serde(rename = "bpmn:Gateway")]
    Gateway,
    #[serde(rename = "bpmn:Artifact")]
    Artifact,
    #[serde(rename = "bpmn:DataAssociation")]
    DataAssociation,
    #[serde(rename = "bpmn:ItemAwareElement")]
    ItemAwareElement,

    // ─── Roots & containers ──────────────────────────────────────────────
    #[serde(rename = "bpmn:Process")]
    Process,
    #[serde(rename = "bpmn:Collaboration")]
    Collaboration,
    #[serde(rename = "bpmn:Participant")]
    Participant,
    #[serde(rename = "bpmn:Lane")]
    Lane,

    // ─── Activities ──────────────────────────────────────────────────────
    #[serde(rename = "bpmn:Task")]
    Task,
    #[serde(rename = "bpmn:UserTask")]
    UserTask,
    #[serde(rename = "bpmn:ServiceTask")]
    ServiceTask,
    #[serde(rename = "bpmn:SendTask")]
    SendTask,
    #[serde(rename = "bpmn:ReceiveTask")]
    ReceiveTask,
    #[serde(rename = "bpmn:ManualTask")]
    ManualTask,
    #[serde(rename = "bpmn:BusinessRuleTask")]
    BusinessRuleTask,
    #[serde(rename = "bpmn:ScriptTask")]
    ScriptTask,
    #[serde(rename = "bpmn:SubProcess")]
    SubProcess,
    #[serde(rename = "bpmn:Transaction")]
    Transaction,
    #[serde(rename = "bpmn:AdHocSubProcess")]
    AdHocSubProcess,
    #[serde(rename = "bpmn:CallActivity")]
    CallActivity,

    // ─── Events ──────────────────────────────────────────────────────────
    #[serde(rename = "bpmn:StartEvent")]
    StartEvent,
    #[serde(rename = "bpmn:EndEvent")]
    EndEvent,
    #[serde(rename = "bpmn:IntermediateThrowEvent")]
    IntermediateThrowEvent,
    #[serde(rename = "bpmn:IntermediateCatchEvent")]
    IntermediateCatchEvent,
    #[serde(rename = "bpmn:BoundaryEvent")]
    BoundaryEvent,

    // ─── Gateways ────────────────────────────────────────────────────────
    #[serde(rename = "bpmn:ExclusiveGateway")]
    ExclusiveGateway,
    #[serde(rename = "bpmn:ParallelGateway")]
    ParallelGateway,
    #[serde(rename = "bpmn:InclusiveGateway")]
    InclusiveGateway,
    #[serde(rename = "bpmn:ComplexGateway")]
    ComplexGateway,
    #[serde(rename = "bpmn:EventBasedGateway")]
    EventBasedGateway,

    // ─── Data ────────────────────────────────────────────────────────────
    #[serde(rename = "bpmn:DataObjectReference")]
    DataObjectReference,
    #[serde(rename = "bpmn:DataStoreReference")]
    DataStoreReference,
    #[serde(rename = "bpmn:DataInput")]
    DataInput,
    #[serde(rename = "bpmn:DataOutput")]
    DataOutput,

    // ─── Artifacts ───────────────────────────────────────────────────────
    #[serde(rename = "bpmn:TextAnnotation")]
    TextAnnotation,
    #[serde(rename = "bpmn:Group")]
    Group,

    // ─── Connections ─────────────────────────────────────────────────────
    #[serde(rename = "bpmn:SequenceFlow")]
    SequenceFlow,
    #[serde(rename = "bpmn:MessageFlow")]
    MessageFlow,
    #[serde(rename = "bpmn:Association")]
    Association,
    #[serde(rename = "bpmn:DataInputAssociation")]
    DataInputAssociation,
    #[serde(rename = "bpmn:DataOutputAssociation")]
    DataOutputAssociation,
}

impl BpmnType {
    /// Direct supertypes in the metamodel.
    pub fn supertypes(self) -> &'static [BpmnType] {
        use BpmnType::*;
        match self {
            BaseElement => &[],
            FlowElement | Lane | Collaboration | MessageFlow | Artifact | DataAssociation
            | ItemAwareElement => &[BaseElement],
            Participant => &[BaseElement, InteractionNode],
            FlowNode => &[FlowElement],
            InteractionNode => &[],
            FlowElementsContainer => &[BaseElement],
            Activity => &[FlowNode],
            Event => &[FlowNode, InteractionNode],
            ThrowEvent | CatchEvent => &[Event],
            Gateway => &[FlowNode],

            Process => &[FlowElementsContainer],

            Task => &[Activity, InteractionNode],
            UserTask | ServiceTask | SendTask | ReceiveTask | ManualTask | BusinessRuleTask
            | ScriptTask => &[Task],
            SubProcess => &[Activity, FlowElementsContainer, InteractionNode],
            Transaction | AdHocSubProcess => &[SubProcess],
            CallActivity => &[Activity, InteractionNode],

            StartEvent | IntermediateCatchEvent | BoundaryEvent => &[CatchEvent],
            EndEvent | IntermediateThrowEvent => &[ThrowEvent],

            ExclusiveGateway | ParallelGateway | InclusiveGateway | ComplexGateway
            | EventBasedGateway => &[Gateway],

            DataObjectReference | DataStoreReference => &[FlowElement, ItemAwareElement],
            DataInput | DataOutput => &[ItemAwareElement],

            TextAnnotation | Group | Association => &[Artifact],

            SequenceFlow => &[FlowElement],
            DataInputAssociation | DataOutputAssociation => &[DataAssociation],
        }
    }

    /// Whether `self` is `ty` or one of its (transitive) subtypes.
    pub fn is(self, ty: BpmnType) -> bool {
        self == ty || self.supertypes().iter().any(|s| s.is(ty))
    }

    /// Whether `self` is any of `types`.
    pub fn is_any(self, types: &[BpmnType]) -> bool {
        types.iter().any(|t| self.is(*t))
    }

    /// Whether instances of this type are drawn as connections.
    pub fn is_connection(self) -> bool {
        self.is_any(&[
            BpmnType::SequenceFlow,
            BpmnType::MessageFlow,
            BpmnType::Association,
            BpmnType::DataAssociation,
        ])
    }

    /// The `bpmn:`-prefixed type name.
    pub fn name(self) -> &'static str {
        use BpmnType::*;
        match self {
            BaseElement => "bpmn:BaseElement",
            FlowElement => "bpmn:FlowElement",
            FlowNode => "bpmn:FlowNode",
            InteractionNode => "bpmn:InteractionNode",
            FlowElementsContainer => "bpmn:FlowElementsContainer",
            Activity => "bpmn:Activity",
            Event => "bpmn:Event",
            ThrowEvent => "bpmn:ThrowEvent",
            CatchEvent => "bpmn:CatchEvent",
            Gateway => "bpmn:Gateway",
            Artifact => "bpmn:Artifact",
            DataAssociation => "bpmn:DataAssociation",
            ItemAwareElement => "bpmn:ItemAwareElement",
            Process => "bpmn:Process",
            Collaboration => "bpmn:Collaboration",
            Participant => "bpmn:Participant",
            Lane => "bpmn:Lane",
            Task => "bpmn:Task",
            UserTask => "bpmn:UserTask",
            ServiceTask => "bpmn:ServiceTask",
            SendTask => "bpmn:SendTask",
            ReceiveTask => "bpmn:ReceiveTask",
            ManualTask => "bpmn:ManualTask",
            BusinessRuleTask => "bpmn:BusinessRuleTask",
            ScriptTask => "bpmn:ScriptTask",
            SubProcess => "bpmn:SubProcess",
            Transaction => "bpmn:Transaction",
            AdHocSubProcess => "bpmn:AdHocSubProcess",
            CallActivity => "bpmn:CallActivity",
            StartEvent => "bpmn:StartEvent",
            EndEvent => "bpmn:EndEvent",
            IntermediateThrowEvent => "bpmn:IntermediateThrowEvent",
            IntermediateCatchEvent => "bpmn:IntermediateCatchEvent",
            BoundaryEvent => "bpmn:BoundaryEvent",
            ExclusiveGateway => "bpmn:ExclusiveGateway",
            ParallelGateway => "bpmn:ParallelGateway",
            InclusiveGateway => "bpmn:InclusiveGateway",
            ComplexGateway => "bpmn:ComplexGateway",
            EventBasedGateway => "bpmn:EventBasedGateway",
            DataObjectReference => "bpmn:DataObjectReference",
            DataStoreReference => "bpmn:DataStoreReference",
            DataInput => "bpmn:DataInput",
            DataOutput => "bpmn:DataOutput",
            TextAnnotation => "bpmn:TextAnnotation",
            Group => "bpmn:Group",
            SequenceFlow => "bpmn:SequenceFlow",
            MessageFlow => "bpmn:MessageFlow",
            Association => "bpmn:Association",
            DataInputAssociation => "bpmn:DataInputAssociation",
            DataOutputAssociation => "bpmn:DataOutputAssociation",
        }
    }

    /// Prefix used when generating element ids of this type.
    pub fn id_prefix(self) -> &'static str {
        let name = self.name().trim_start_matches("bpmn:");
        if self.is(BpmnType::SequenceFlow) {
            "Flow"
        } else if self.is(BpmnType::Gateway) {
            "Gateway"
        } else if self.is(BpmnType::Event) {
            "Event"
        } else if self.is(BpmnType::Task) {
            "Activity"
        } else {
            name
        }
    }
}

impl fmt::Display for BpmnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BpmnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let de: StrDeserializer<'_, serde::de::value::Error> = s.into_deserializer();
        BpmnType::deserialize(de).map_err(|_| format!("unknown BPMN type `{s}`"))
    }
}

/// Event definitions an event may carry. An event without any is a "none"
/// (blank) event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventDefinition {
    #[serde(rename = "bpmn:MessageEventDefinition")]
    Message,
    #[serde(rename = "bpmn:TimerEventDefinition")]
    Timer,
    #[serde(rename = "bpmn:SignalEventDefinition")]
    Signal,
    #[serde(rename = "bpmn:ConditionalEventDefinition")]
    Conditional,
    #[serde(rename = "bpmn:ErrorEventDefinition")]
    Error,
    #[serde(rename = "bpmn:EscalationEventDefinition")]
    Escalation,
    #[serde(rename = "bpmn:CompensateEventDefinition")]
    Compensate,
    #[serde(rename = "bpmn:CancelEventDefinition")]
    Cancel,
    #[serde(rename = "bpmn:LinkEventDefinition")]
    Link,
    #[serde(rename = "bpmn:TerminateEventDefinition")]
    Terminate,
}
