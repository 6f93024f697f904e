pub const HELP_COMMAND: &str = "help";
pub const HELLO_COMMAND: &str = "hello";

pub const HELP: &str = "用法：\n* 二维码生成\n```@小码 {内容}```\n内容左右的空格和回车会被忽略。\n* 二维码识别\n群聊中，引用已发出的图片消息并`@小码`，私聊中可直接发送图片。\n提示：私聊中，`@小码`需要省略。";
pub const HELLO: &str = "小码来啦！驾～ []~(￣▽￣)~*";

pub const NO_ATTACHMENT: &str =
    "没能在您引用的消息中找到图片附件，您可以复制图片单独发一下再试试。:face_with_cowboy_hat:  \n";
pub const ATTACHMENT_TOO_LARGE: &str = "图片附件体积过大，抱歉。:ghost: ";
pub const UNSUPPORTED_MIME: &str = "仅支持jpeg, png或gif格式的图片哟。:kissing_heart: ";
pub const SCAN_FAILED: &str = "哦噢，出错了。:dizzy_face: ";
pub const NOT_FOUND: &str =
    "没能在您的图片中找到二维码/条形码，或者它们损坏了，小码会继续努力哒！ :kissing_heart: ";
pub const SCAN_RESULT: &str = ":sunglasses:  扫描结果如下：\n";
pub const EMPTY_CONTENT: &str = "您没有输入有效内容哟。 :wink: \n";
pub const ENCODED: &str = ":hugging_face: 这是您的:horse: ：";
