pub use crate::clipboard::{centroid, translate, ClipboardError, CopyPasteHandler};
pub use crate::connection_manager::{Connection, ConnectionError};
pub use crate::document::{GraphDocument, StreamError, GRAPH_FORMAT_VERSION};
pub use crate::elements::basic_lib::BasicLib;
pub use crate::evaluation::{EvaluationContext, EvaluationStats};
pub use crate::group::{Color, GroupId, NodeGroup};
pub use crate::merge::{IdMap, IdPolicy, MergeError, MergeEventHandler};
pub use crate::node::{CalcStatus, Node, NodeError};
pub use crate::node_collection::NodeCollection;
pub use crate::node_lib::{
    InputInfo, NodeLambda, NodeLib, NodeType, NodeTypeId, OutputInfo, ParamInfo,
};
pub use crate::node_manager::{GraphError, GraphResult, NodeManager};
pub use crate::slot::{ConnectionMode, InputSlotRef, NodeId, OutputSlotRef, SlotId};
pub use crate::undo::{UndoConfig, UndoError, UndoHandler};
pub use crate::value::{DataType, Value};
