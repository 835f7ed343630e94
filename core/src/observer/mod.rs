mod dispatch;

pub(crate) use dispatch::ObserverDispatch;
